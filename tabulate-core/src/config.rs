use std::error;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A record terminator used when writing CSV data.
///
/// When reading, `\r`, `\n` and `\r\n` are always recognized as a single
/// record terminator regardless of this setting. This only determines the
/// exact bytes emitted after each row by a writer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LineTerminator {
    /// `\n`
    LF,
    /// `\r\n`
    ///
    /// This is the default on every platform.
    CRLF,
    /// `\r`
    CR,
}

impl LineTerminator {
    /// Returns the terminator exactly as it is written.
    pub fn as_str(&self) -> &'static str {
        match *self {
            LineTerminator::LF => "\n",
            LineTerminator::CRLF => "\r\n",
            LineTerminator::CR => "\r",
        }
    }
}

impl Default for LineTerminator {
    fn default() -> LineTerminator {
        LineTerminator::CRLF
    }
}

/// How a quote character is escaped inside a quoted field.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EscapeMode {
    /// Quotes are escaped by doubling them, e.g., `"` is written as `""`.
    ///
    /// This is the default.
    Doubled,
    /// Any character following the given escape character inside a quoted
    /// field is taken literally, e.g., `\"` is a literal quote when the
    /// escape character is `\`.
    ///
    /// Doubled quotes are still read as one literal quote in this mode, but
    /// the writer always uses the escape character. The escape character
    /// cannot be the quote itself; use `Doubled` for that.
    Escape(char),
}

impl EscapeMode {
    /// Returns the escape character, if one is used.
    pub fn escape_char(&self) -> Option<char> {
        match *self {
            EscapeMode::Doubled => None,
            EscapeMode::Escape(c) => Some(c),
        }
    }
}

impl Default for EscapeMode {
    fn default() -> EscapeMode {
        EscapeMode::Doubled
    }
}

/// An immutable description of a CSV dialect.
///
/// A `FormatConfig` is shared by reference between readers and writers and
/// is never mutated by them. It can only be constructed through
/// `FormatConfigBuilder::build` (or `Default`), which guarantees that the
/// dialect is unambiguous.
///
/// # Example
///
/// ```
/// use tabulate_core::{FormatConfig, LineTerminator};
///
/// let cfg = FormatConfig::builder()
///     .separator(';')
///     .line_terminator(LineTerminator::LF)
///     .build()
///     .unwrap();
/// assert_eq!(cfg.separator(), ';');
/// assert_eq!(cfg.quote(), '"');
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "FormatSpec", into = "FormatSpec")
)]
pub struct FormatConfig {
    separator: char,
    quote: char,
    escape: EscapeMode,
    line_terminator: LineTerminator,
    allow_comments: bool,
    comment: char,
    strict_quoting: bool,
}

impl Default for FormatConfig {
    fn default() -> FormatConfig {
        FormatConfig {
            separator: ',',
            quote: '"',
            escape: EscapeMode::Doubled,
            line_terminator: LineTerminator::CRLF,
            allow_comments: false,
            comment: '#',
            strict_quoting: true,
        }
    }
}

impl FormatConfig {
    /// The default dialect: `,` separated, `"` quoted with doubled quote
    /// escapes and `\r\n` record terminators.
    pub fn new() -> FormatConfig {
        FormatConfig::default()
    }

    /// Create a builder starting from the default dialect.
    pub fn builder() -> FormatConfigBuilder {
        FormatConfigBuilder::new()
    }

    /// Tab separated values, otherwise identical to the default dialect.
    pub fn tsv() -> FormatConfig {
        FormatConfig { separator: '\t', ..FormatConfig::default() }
    }

    /// Semicolon separated values, otherwise identical to the default
    /// dialect.
    pub fn semicolon() -> FormatConfig {
        FormatConfig { separator: ';', ..FormatConfig::default() }
    }

    /// The character separating fields.
    pub fn separator(&self) -> char {
        self.separator
    }

    /// The character used to quote fields.
    pub fn quote(&self) -> char {
        self.quote
    }

    /// How quotes are escaped inside quoted fields.
    pub fn escape(&self) -> EscapeMode {
        self.escape
    }

    /// The terminator written after each row.
    pub fn line_terminator(&self) -> LineTerminator {
        self.line_terminator
    }

    /// Whether lines starting with the comment character are skipped when
    /// reading.
    pub fn allow_comments(&self) -> bool {
        self.allow_comments
    }

    /// The comment character. Only meaningful when comments are allowed.
    pub fn comment(&self) -> char {
        self.comment
    }

    /// The comment character, if comments are allowed.
    pub fn comment_marker(&self) -> Option<char> {
        if self.allow_comments {
            Some(self.comment)
        } else {
            None
        }
    }

    /// Whether a row made of a single empty field is written quoted.
    pub fn strict_quoting(&self) -> bool {
        self.strict_quoting
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.separator == self.quote {
            return Err(ConfigError::SeparatorIsQuote(self.separator));
        }
        let roles = [
            ("separator", Some(self.separator)),
            ("quote", Some(self.quote)),
            ("escape", self.escape.escape_char()),
            ("comment", self.comment_marker()),
        ];
        for &(role, c) in &roles {
            if let Some(c) = c {
                if c == '\r' || c == '\n' {
                    return Err(ConfigError::LineBreak { role, ch: c });
                }
            }
        }
        if let Some(c) = self.comment_marker() {
            if c == self.separator || c == self.quote {
                return Err(ConfigError::AmbiguousComment(c));
            }
        }
        if let Some(c) = self.escape.escape_char() {
            if c == self.separator {
                return Err(ConfigError::EscapeIsSeparator(c));
            }
            if c == self.quote {
                return Err(ConfigError::EscapeIsQuote(c));
            }
        }
        Ok(())
    }
}

/// Builds a `FormatConfig` with various configuration knobs.
///
/// Every setter starts from the default dialect. The dialect is checked when
/// `build` is called.
#[derive(Clone, Debug, Default)]
pub struct FormatConfigBuilder {
    cfg: FormatConfig,
}

impl FormatConfigBuilder {
    /// Create a new builder.
    pub fn new() -> FormatConfigBuilder {
        FormatConfigBuilder::default()
    }

    /// Check the configured dialect and return it.
    ///
    /// # Errors
    ///
    /// An error is returned when the dialect is ambiguous: the separator
    /// equals the quote, a special character is a line break, the comment
    /// character collides with the separator or quote, or the escape
    /// character equals the separator or the quote.
    pub fn build(&self) -> Result<FormatConfig, ConfigError> {
        self.cfg.validate()?;
        Ok(self.cfg.clone())
    }

    /// The field separator.
    ///
    /// The default is `,`.
    pub fn separator(&mut self, separator: char) -> &mut FormatConfigBuilder {
        self.cfg.separator = separator;
        self
    }

    /// The quote character.
    ///
    /// The default is `"`.
    pub fn quote(&mut self, quote: char) -> &mut FormatConfigBuilder {
        self.cfg.quote = quote;
        self
    }

    /// The quote escaping convention.
    ///
    /// The default is `EscapeMode::Doubled`.
    pub fn escape(&mut self, escape: EscapeMode) -> &mut FormatConfigBuilder {
        self.cfg.escape = escape;
        self
    }

    /// The record terminator used when writing.
    ///
    /// The default is `LineTerminator::CRLF`.
    pub fn line_terminator(
        &mut self,
        term: LineTerminator,
    ) -> &mut FormatConfigBuilder {
        self.cfg.line_terminator = term;
        self
    }

    /// Skip lines that begin with the comment character when reading.
    ///
    /// This is disabled by default.
    pub fn allow_comments(&mut self, yes: bool) -> &mut FormatConfigBuilder {
        self.cfg.allow_comments = yes;
        self
    }

    /// The comment character.
    ///
    /// The default is `#`. It has no effect unless comments are allowed.
    pub fn comment(&mut self, comment: char) -> &mut FormatConfigBuilder {
        self.cfg.comment = comment;
        self
    }

    /// Write a row consisting of one empty field as `""`.
    ///
    /// This is enabled by default. When disabled, such a row is written as
    /// an empty line.
    pub fn strict_quoting(&mut self, yes: bool) -> &mut FormatConfigBuilder {
        self.cfg.strict_quoting = yes;
        self
    }
}

/// The serialized form of a `FormatConfig`.
///
/// Deserialization goes through this type so that a dialect loaded from a
/// configuration file is validated exactly like one built in code.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
#[serde(default)]
struct FormatSpec {
    separator: char,
    quote: char,
    escape: EscapeMode,
    line_terminator: LineTerminator,
    allow_comments: bool,
    comment: char,
    strict_quoting: bool,
}

#[cfg(feature = "serde")]
impl Default for FormatSpec {
    fn default() -> FormatSpec {
        FormatSpec::from(FormatConfig::default())
    }
}

#[cfg(feature = "serde")]
impl From<FormatConfig> for FormatSpec {
    fn from(cfg: FormatConfig) -> FormatSpec {
        FormatSpec {
            separator: cfg.separator,
            quote: cfg.quote,
            escape: cfg.escape,
            line_terminator: cfg.line_terminator,
            allow_comments: cfg.allow_comments,
            comment: cfg.comment,
            strict_quoting: cfg.strict_quoting,
        }
    }
}

#[cfg(feature = "serde")]
impl std::convert::TryFrom<FormatSpec> for FormatConfig {
    type Error = ConfigError;

    fn try_from(raw: FormatSpec) -> Result<FormatConfig, ConfigError> {
        FormatConfig::builder()
            .separator(raw.separator)
            .quote(raw.quote)
            .escape(raw.escape)
            .line_terminator(raw.line_terminator)
            .allow_comments(raw.allow_comments)
            .comment(raw.comment)
            .strict_quoting(raw.strict_quoting)
            .build()
    }
}

/// An error describing why a dialect is invalid.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// The separator and the quote are the same character.
    SeparatorIsQuote(char),
    /// A special character is `\r` or `\n`, which are reserved as record
    /// terminators.
    LineBreak {
        /// The role of the offending character, e.g., `"separator"`.
        role: &'static str,
        /// The offending character.
        ch: char,
    },
    /// The comment character equals the separator or the quote.
    AmbiguousComment(char),
    /// The escape character equals the separator.
    EscapeIsSeparator(char),
    /// The escape character equals the quote.
    EscapeIsQuote(char),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConfigError::SeparatorIsQuote(c) => write!(
                f,
                "invalid CSV format: separator and quote are both {:?}",
                c
            ),
            ConfigError::LineBreak { role, ch } => write!(
                f,
                "invalid CSV format: {} cannot be the line break {:?}",
                role, ch
            ),
            ConfigError::AmbiguousComment(c) => write!(
                f,
                "invalid CSV format: comment character {:?} is also the \
                 separator or quote",
                c
            ),
            ConfigError::EscapeIsSeparator(c) => write!(
                f,
                "invalid CSV format: escape character {:?} is also the \
                 separator",
                c
            ),
            ConfigError::EscapeIsQuote(c) => write!(
                f,
                "invalid CSV format: escape character {:?} is also the \
                 quote, use doubled quotes instead",
                c
            ),
        }
    }
}

impl error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, EscapeMode, FormatConfig, FormatConfigBuilder,
        LineTerminator,
    };

    #[test]
    fn defaults() {
        let cfg = FormatConfig::default();
        assert_eq!(cfg.separator(), ',');
        assert_eq!(cfg.quote(), '"');
        assert_eq!(cfg.escape(), EscapeMode::Doubled);
        assert_eq!(cfg.line_terminator().as_str(), "\r\n");
        assert!(!cfg.allow_comments());
        assert_eq!(cfg.comment_marker(), None);
        assert!(cfg.strict_quoting());
        assert_eq!(FormatConfigBuilder::new().build(), Ok(cfg));
    }

    #[test]
    fn presets() {
        assert_eq!(FormatConfig::tsv().separator(), '\t');
        assert_eq!(FormatConfig::semicolon().separator(), ';');
        assert_eq!(FormatConfig::tsv().quote(), '"');
    }

    #[test]
    fn separator_is_quote() {
        let err = FormatConfig::builder().separator('"').build().unwrap_err();
        assert_eq!(err, ConfigError::SeparatorIsQuote('"'));

        let err = FormatConfig::builder().quote(',').build().unwrap_err();
        assert_eq!(err, ConfigError::SeparatorIsQuote(','));
    }

    #[test]
    fn line_breaks_are_reserved() {
        let err = FormatConfig::builder().separator('\n').build().unwrap_err();
        assert_eq!(
            err,
            ConfigError::LineBreak { role: "separator", ch: '\n' }
        );
        let err = FormatConfig::builder()
            .escape(EscapeMode::Escape('\r'))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::LineBreak { role: "escape", ch: '\r' });
    }

    #[test]
    fn comment_collisions_only_matter_when_enabled() {
        assert!(FormatConfig::builder().comment(',').build().is_ok());
        let err = FormatConfig::builder()
            .comment(',')
            .allow_comments(true)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::AmbiguousComment(','));
    }

    #[test]
    fn escape_is_separator() {
        let err = FormatConfig::builder()
            .separator('\\')
            .escape(EscapeMode::Escape('\\'))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::EscapeIsSeparator('\\'));
    }

    #[test]
    fn escape_is_quote() {
        let err = FormatConfig::builder()
            .escape(EscapeMode::Escape('"'))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::EscapeIsQuote('"'));

        let err = FormatConfig::builder()
            .quote('\'')
            .escape(EscapeMode::Escape('\''))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::EscapeIsQuote('\''));

        assert!(FormatConfig::builder()
            .quote('\'')
            .escape(EscapeMode::Escape('"'))
            .build()
            .is_ok());
    }

    #[test]
    fn shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FormatConfig>();
        assert_send_sync::<FormatConfigBuilder>();
        assert_send_sync::<ConfigError>();
    }

    #[test]
    fn terminators() {
        assert_eq!(LineTerminator::LF.as_str(), "\n");
        assert_eq!(LineTerminator::CR.as_str(), "\r");
        assert_eq!(LineTerminator::default(), LineTerminator::CRLF);
    }

    #[test]
    fn error_messages() {
        let err = ConfigError::SeparatorIsQuote('"');
        assert_eq!(
            err.to_string(),
            "invalid CSV format: separator and quote are both '\"'"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip_and_validation() {
        let cfg = FormatConfig::builder()
            .separator(';')
            .escape(EscapeMode::Escape('\\'))
            .line_terminator(LineTerminator::LF)
            .build()
            .unwrap();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: FormatConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);

        let partial: FormatConfig =
            serde_json::from_str(r#"{"separator": "\t"}"#).unwrap();
        assert_eq!(partial, FormatConfig::tsv());

        let bad = serde_json::from_str::<FormatConfig>(r#"{"quote": ","}"#);
        assert!(bad.is_err());

        let bad = serde_json::from_str::<FormatConfig>(
            r#"{"escape": {"escape": "\""}}"#,
        );
        assert!(bad.is_err());
    }
}
