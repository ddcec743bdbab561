use memchr::{memchr, memchr3};

use crate::config::{EscapeMode, FormatConfig, LineTerminator};

/// A push based CSV field encoder.
///
/// The encoder appends fields to a caller provided `String`, inserting
/// separators between fields and quoting fields only when necessary. It
/// performs no I/O.
///
/// A field is quoted if and only if it contains the separator, the quote
/// character, `\r` or `\n`, if it is the first field of a row and starts
/// with the comment character (when comments are enabled), or, with strict
/// quoting, if it is the only field of its row and is empty. The last rule
/// keeps such a row from being indistinguishable from no row at all.
///
/// # RFC 4180
///
/// This encoder conforms to RFC 4180 with one exception: it doesn't guarantee
/// that all rows written are of the same length. Instead, the onus is on the
/// caller to ensure that all rows written are of the same length.
#[derive(Clone, Debug)]
pub struct Encoder {
    separator: char,
    quote: char,
    escape: EscapeMode,
    term: LineTerminator,
    comment: Option<char>,
    strict_quoting: bool,
    /// The bytes that force quoting, when all of them are ASCII.
    needles: Option<[u8; 4]>,
    fields_in_row: usize,
    lone_empty: bool,
}

impl Encoder {
    /// Create an encoder for the given dialect.
    pub fn new(cfg: &FormatConfig) -> Encoder {
        let needles = if cfg.separator().is_ascii() && cfg.quote().is_ascii()
        {
            Some([cfg.separator() as u8, cfg.quote() as u8, b'\r', b'\n'])
        } else {
            None
        };
        Encoder {
            separator: cfg.separator(),
            quote: cfg.quote(),
            escape: cfg.escape(),
            term: cfg.line_terminator(),
            comment: cfg.comment_marker(),
            strict_quoting: cfg.strict_quoting(),
            needles,
            fields_in_row: 0,
            lone_empty: false,
        }
    }

    /// Returns true if `field` must be quoted.
    ///
    /// `first_in_row` indicates whether `field` starts a row, which matters
    /// when comments are enabled.
    pub fn needs_quotes(&self, field: &str, first_in_row: bool) -> bool {
        if first_in_row {
            if let Some(c) = self.comment {
                if field.starts_with(c) {
                    return true;
                }
            }
        }
        match self.needles {
            Some([sep, quote, cr, lf]) => {
                let bytes = field.as_bytes();
                memchr3(sep, quote, lf, bytes).is_some()
                    || memchr(cr, bytes).is_some()
            }
            None => field.chars().any(|c| self.is_special(c)),
        }
    }

    fn is_special(&self, c: char) -> bool {
        c == self.separator || c == self.quote || c == '\r' || c == '\n'
    }

    /// Append `input` as the next field of the current row.
    pub fn field(&mut self, input: &str, out: &mut String) {
        let first = self.fields_in_row == 0;
        if !first {
            out.push(self.separator);
        }
        self.fields_in_row += 1;
        if !self.needs_quotes(input, first) {
            self.lone_empty = first && input.is_empty();
            out.push_str(input);
            return;
        }
        self.lone_empty = false;
        out.reserve(input.len() + 2);
        out.push(self.quote);
        match self.escape {
            EscapeMode::Doubled => {
                for c in input.chars() {
                    if c == self.quote {
                        out.push(c);
                    }
                    out.push(c);
                }
            }
            EscapeMode::Escape(esc) => {
                for c in input.chars() {
                    if c == self.quote || c == esc {
                        out.push(esc);
                    }
                    out.push(c);
                }
            }
        }
        out.push(self.quote);
    }

    /// Finish the current row.
    ///
    /// This must be called after the last field of every row and before its
    /// terminator (if any).
    pub fn finish_row(&mut self, out: &mut String) {
        if self.strict_quoting && self.fields_in_row == 1 && self.lone_empty {
            out.push(self.quote);
            out.push(self.quote);
        }
        self.fields_in_row = 0;
        self.lone_empty = false;
    }

    /// Append the configured record terminator.
    pub fn terminator(&self, out: &mut String) {
        out.push_str(self.term.as_str());
    }

    /// Returns true if no field has been written since the last call to
    /// `finish_row`.
    pub fn at_row_start(&self) -> bool {
        self.fields_in_row == 0
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{
        EscapeMode, FormatConfig, FormatConfigBuilder, LineTerminator,
    };

    use super::Encoder;

    fn encode(cfg: &FormatConfig, rows: &[&[&str]]) -> String {
        let mut enc = Encoder::new(cfg);
        let mut out = String::new();
        for row in rows {
            for field in row.iter() {
                enc.field(field, &mut out);
            }
            enc.finish_row(&mut out);
            enc.terminator(&mut out);
        }
        out
    }

    #[test]
    fn minimal_quoting() {
        let cfg = FormatConfig::default();
        assert_eq!(encode(&cfg, &[&["a", "b c", "d"]]), "a,b c,d\r\n");
        assert_eq!(encode(&cfg, &[&["x", "y,z"]]), "x,\"y,z\"\r\n");
    }

    #[test]
    fn quotes_are_doubled() {
        let cfg = FormatConfig::default();
        assert_eq!(encode(&cfg, &[&["a\"b", "\""]]), "\"a\"\"b\",\"\"\"\"\r\n");
    }

    #[test]
    fn line_breaks_are_quoted_for_any_terminator() {
        let cfg = FormatConfigBuilder::new()
            .line_terminator(LineTerminator::LF)
            .build()
            .unwrap();
        assert_eq!(encode(&cfg, &[&["a\rb", "c\nd"]]), "\"a\rb\",\"c\nd\"\n");
    }

    #[test]
    fn empty_fields() {
        let cfg = FormatConfig::default();
        assert_eq!(encode(&cfg, &[&["", ""]]), ",\r\n");
        assert_eq!(encode(&cfg, &[&["a", ""]]), "a,\r\n");
        assert_eq!(encode(&cfg, &[&[""]]), "\"\"\r\n");
        assert_eq!(encode(&cfg, &[&[]]), "\r\n");

        let lax = FormatConfigBuilder::new().strict_quoting(false).build().unwrap();
        assert_eq!(encode(&lax, &[&[""]]), "\r\n");
    }

    #[test]
    fn escape_mode() {
        let cfg = FormatConfigBuilder::new()
            .escape(EscapeMode::Escape('\\'))
            .build()
            .unwrap();
        assert_eq!(encode(&cfg, &[&[r#"a\b"#]]), "a\\b\r\n");
        assert_eq!(encode(&cfg, &[&[r#"a"\b"#]]), "\"a\\\"\\\\b\"\r\n");
    }

    #[test]
    fn separators() {
        let cfg = FormatConfig::semicolon();
        assert_eq!(encode(&cfg, &[&["a,b", "c;d"]]), "a,b;\"c;d\"\r\n");

        let cfg = FormatConfig::tsv();
        assert_eq!(encode(&cfg, &[&["a b", "c\td"]]), "a b\t\"c\td\"\r\n");
    }

    #[test]
    fn non_ascii_dialect() {
        let cfg = FormatConfigBuilder::new()
            .separator('§')
            .quote('«')
            .build()
            .unwrap();
        let enc = Encoder::new(&cfg);
        assert!(enc.needs_quotes("a§b", false));
        assert!(enc.needs_quotes("a«b", false));
        assert!(enc.needs_quotes("a\nb", false));
        assert!(!enc.needs_quotes("a,b\"c", false));
        assert_eq!(encode(&cfg, &[&["a«", "b"]]), "«a«««§b\r\n");
    }

    #[test]
    fn comment_marker_quoted_at_row_start() {
        let cfg = FormatConfigBuilder::new().allow_comments(true).build().unwrap();
        assert_eq!(encode(&cfg, &[&["#a", "#b"]]), "\"#a\",#b\r\n");

        let cfg = FormatConfig::default();
        assert_eq!(encode(&cfg, &[&["#a"]]), "#a\r\n");
    }

    #[test]
    fn row_state() {
        let cfg = FormatConfig::default();
        let mut enc = Encoder::new(&cfg);
        let mut out = String::new();
        assert!(enc.at_row_start());
        enc.field("a", &mut out);
        assert!(!enc.at_row_start());
        enc.finish_row(&mut out);
        assert!(enc.at_row_start());
        enc.field("b", &mut out);
        assert_eq!(out, "ab");
    }
}
