use std::error;
use std::fmt;
use std::io;
use std::result;

use tabulate_core::{ConfigError, ParseErrorKind, Position};

/// A type alias for `Result<T, tabulate::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when processing CSV data.
///
/// This error can happen when reading or writing CSV data, or when building
/// a dialect.
#[derive(Debug)]
pub enum Error {
    /// An I/O error that occurred while reading or writing CSV data.
    Io(io::Error),
    /// The CSV data is not valid UTF-8.
    Utf8 {
        /// The position of the row in which this error occurred.
        pos: Position,
        /// The byte offset of the invalid sequence.
        byte: u64,
    },
    /// A row violates the quoting rules of its dialect, or the data ended
    /// inside a quoted field.
    Parse {
        /// The position of the row in which this error occurred.
        pos: Position,
        /// The index of the offending field in its row.
        field: usize,
        /// What went wrong.
        kind: ParseErrorKind,
    },
    /// An invalid dialect.
    Config(ConfigError),
}

/// The broad category of an `Error`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// A quoting or escaping violation within a row.
    MalformedRow,
    /// The data ended inside a quoted field.
    UnexpectedEndOfStream,
    /// The underlying reader or writer failed, or did not produce UTF-8.
    IoFailure,
    /// The dialect is invalid.
    ConfigurationError,
}

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match *self {
            Error::Io(_) | Error::Utf8 { .. } => ErrorKind::IoFailure,
            Error::Parse { kind, .. } => {
                if kind.is_malformed_row() {
                    ErrorKind::MalformedRow
                } else {
                    ErrorKind::UnexpectedEndOfStream
                }
            }
            Error::Config(_) => ErrorKind::ConfigurationError,
        }
    }

    /// The position of the row in which this error occurred, if known.
    pub fn position(&self) -> Option<&Position> {
        match *self {
            Error::Utf8 { ref pos, .. } | Error::Parse { ref pos, .. } => {
                Some(pos)
            }
            Error::Io(_) | Error::Config(_) => None,
        }
    }

    /// Returns true if this is an I/O error.
    pub fn is_io_error(&self) -> bool {
        match *self {
            Error::Io(_) => true,
            _ => false,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Error {
        Error::Config(err)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Io(err) => err,
            err => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Config(ref err) => Some(err),
            Error::Utf8 { .. } | Error::Parse { .. } => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => err.fmt(f),
            Error::Utf8 { ref pos, byte } => write!(
                f,
                "CSV parse error: row {} (line {}, byte {}): \
                 invalid UTF-8 at byte {}",
                pos.row(),
                pos.line(),
                pos.byte(),
                byte
            ),
            Error::Parse { ref pos, field, kind } => write!(
                f,
                "CSV parse error: row {} (line {}, byte {}, field {}): {}",
                pos.row(),
                pos.line(),
                pos.byte(),
                field,
                kind
            ),
            Error::Config(ref err) => err.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;
    use std::io;

    use tabulate_core::{ConfigError, ParseErrorKind, Position};

    use super::{Error, ErrorKind};

    #[test]
    fn kinds() {
        let pos = Position::new();
        let malformed = Error::Parse {
            pos,
            field: 0,
            kind: ParseErrorKind::InvalidCharAfterQuote('x'),
        };
        assert_eq!(malformed.kind(), ErrorKind::MalformedRow);

        let eos = Error::Parse {
            pos,
            field: 2,
            kind: ParseErrorKind::UnexpectedEndOfStream,
        };
        assert_eq!(eos.kind(), ErrorKind::UnexpectedEndOfStream);
        assert_eq!(eos.position(), Some(&pos));

        let io_err = Error::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(io_err.kind(), ErrorKind::IoFailure);
        assert!(io_err.is_io_error());
        assert!(io_err.source().is_some());
        assert_eq!(io_err.position(), None);

        let utf8 = Error::Utf8 { pos, byte: 3 };
        assert_eq!(utf8.kind(), ErrorKind::IoFailure);
        assert!(!utf8.is_io_error());

        let cfg = Error::from(ConfigError::SeparatorIsQuote(','));
        assert_eq!(cfg.kind(), ErrorKind::ConfigurationError);
    }

    #[test]
    fn display() {
        let err = Error::Parse {
            pos: Position::new(),
            field: 1,
            kind: ParseErrorKind::InvalidCharAfterQuote('c'),
        };
        assert_eq!(
            err.to_string(),
            "CSV parse error: row 0 (line 1, byte 0, field 1): \
             unexpected 'c' after closing quote"
        );
    }

    #[test]
    fn into_io_error() {
        let err = Error::Utf8 { pos: Position::new(), byte: 0 };
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
    }
}
