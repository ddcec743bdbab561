use std::fmt;

use crate::config::{EscapeMode, FormatConfig};

/// A position in CSV data.
///
/// Readers report the position at which the current row started.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Position {
    byte: u64,
    line: u64,
    row: u64,
}

impl Default for Position {
    fn default() -> Position {
        Position::new()
    }
}

impl Position {
    /// A position at the start of data: byte `0`, line `1`, row `0`.
    pub fn new() -> Position {
        Position { byte: 0, line: 1, row: 0 }
    }

    /// The byte offset, starting at `0`.
    pub fn byte(&self) -> u64 {
        self.byte
    }

    /// The line number, starting at `1`. `\r`, `\n` and `\r\n` each count as
    /// one line break, including those inside quoted fields.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// The row number, starting at `1` for the first row. Comment lines are
    /// not rows. This is `0` before any row has started.
    pub fn row(&self) -> u64 {
        self.row
    }
}

/// The reason a row could not be tokenized.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseErrorKind {
    /// A closing quote was followed by something other than a separator,
    /// a record terminator or the end of data.
    InvalidCharAfterQuote(char),
    /// The data ended inside a quoted field.
    UnexpectedEndOfStream,
}

impl ParseErrorKind {
    /// Returns true if this is a quoting or escaping violation inside a row,
    /// as opposed to data that ended too early.
    pub fn is_malformed_row(&self) -> bool {
        match *self {
            ParseErrorKind::InvalidCharAfterQuote(_) => true,
            ParseErrorKind::UnexpectedEndOfStream => false,
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParseErrorKind::InvalidCharAfterQuote(c) => {
                write!(f, "unexpected {:?} after closing quote", c)
            }
            ParseErrorKind::UnexpectedEndOfStream => {
                write!(f, "data ended inside a quoted field")
            }
        }
    }
}

/// The result of tokenizing at most one row.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadRowResult {
    /// The caller provided input was exhausted before the end of a row was
    /// found. Call again with more input, or with empty input at the end of
    /// data.
    InputEmpty,
    /// The end of a row was found. Its fields are in the output buffers.
    Row,
    /// The current row is malformed.
    ///
    /// The tokenizer discards input up to the next record terminator before
    /// it starts a new row, so callers may keep calling `read_row` to recover.
    /// The contents of the output buffers are unspecified.
    Error {
        /// What went wrong.
        kind: ParseErrorKind,
        /// The index of the offending field in its row.
        field: usize,
    },
    /// All data has been read.
    ///
    /// This is only returned when empty input is provided.
    End,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    StartRecord,
    StartField,
    InField,
    InQuotedField,
    QuoteInQuoted,
    EscapeInQuoted,
    InComment,
    // A `\r` ended the previous line. A `\n` right after it is part of the
    // same terminator.
    SkipLF,
    Resync,
    End,
}

/// What a single transition did with its input character.
#[derive(Clone, Copy, Debug)]
enum Step {
    /// The character was consumed.
    Consume,
    /// The character must be fed again in the new state.
    Stay,
    /// The character was consumed and completed a row or an error.
    Emit(ReadRowResult),
}

/// A push based CSV tokenizer.
///
/// The tokenizer is a finite state machine. Callers feed it chunks of text
/// with `read_row` and it copies unescaped field data into a caller provided
/// `String`, recording the end offset of every field. It never performs I/O
/// and never blocks.
///
/// This tokenizer is deliberately permissive in one place: a quote inside an
/// unquoted field is an ordinary character. Everything else follows RFC 4180
/// with these extensions:
///
/// * `\r`, `\n` and `\r\n` are each a single record terminator.
/// * Rows may have differing numbers of fields.
/// * A blank line is a row with one empty field.
/// * Lines starting with a comment character may be skipped.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    separator: char,
    quote: char,
    escape: Option<char>,
    comment: Option<char>,
    state: State,
    /// Position just past the last consumed character.
    cur: Position,
    /// Position where the current (or last) row started.
    row_start: Position,
    last_was_cr: bool,
}

impl Tokenizer {
    /// Create a tokenizer for the given dialect.
    pub fn new(cfg: &FormatConfig) -> Tokenizer {
        let escape = match cfg.escape() {
            EscapeMode::Doubled => None,
            EscapeMode::Escape(c) => Some(c),
        };
        Tokenizer {
            separator: cfg.separator(),
            quote: cfg.quote(),
            escape,
            comment: cfg.comment_marker(),
            state: State::StartRecord,
            cur: Position::new(),
            row_start: Position::new(),
            last_was_cr: false,
        }
    }

    /// Reset the tokenizer such that it behaves as if it had never been
    /// used.
    pub fn reset(&mut self) {
        self.state = State::StartRecord;
        self.cur = Position::new();
        self.row_start = Position::new();
        self.last_was_cr = false;
    }

    /// The position at which the current row started, or the last row if
    /// no row is in progress.
    pub fn position(&self) -> Position {
        self.row_start
    }

    /// The number of bytes consumed so far.
    pub fn byte(&self) -> u64 {
        self.cur.byte
    }

    /// The current line number.
    pub fn line(&self) -> u64 {
        self.cur.line
    }

    /// Returns true once `read_row` has returned `ReadRowResult::End`.
    pub fn is_done(&self) -> bool {
        self.state == State::End
    }

    /// Tokenize `input`, appending field data to `fields` and the end offset
    /// of each field (into `fields`) to `ends`.
    ///
    /// At most one row is tokenized per call. The second value returned is
    /// the number of bytes of `input` consumed. Output accumulates across
    /// calls that return `InputEmpty`; callers should clear both buffers
    /// before starting a new row.
    ///
    /// # Termination
    ///
    /// An empty `input` signals the end of data. Callers should keep calling
    /// with empty input until `ReadRowResult::End` is returned, since the
    /// end of data may complete a final row first.
    pub fn read_row(
        &mut self,
        input: &str,
        fields: &mut String,
        ends: &mut Vec<usize>,
    ) -> (ReadRowResult, usize) {
        if input.is_empty() {
            return (self.finish(fields, ends), 0);
        }
        if self.state == State::End {
            return (ReadRowResult::End, 0);
        }
        let mut chars = input.char_indices().peekable();
        while let Some(&(i, c)) = chars.peek() {
            match self.transition(c, fields, ends) {
                Step::Stay => {}
                Step::Consume => {
                    self.advance(c);
                    chars.next();
                }
                Step::Emit(res) => {
                    self.advance(c);
                    return (res, i + c.len_utf8());
                }
            }
        }
        (ReadRowResult::InputEmpty, input.len())
    }

    fn advance(&mut self, c: char) {
        self.cur.byte += c.len_utf8() as u64;
        if c == '\r' || (c == '\n' && !self.last_was_cr) {
            self.cur.line += 1;
        }
        self.last_was_cr = c == '\r';
    }

    fn finish(
        &mut self,
        fields: &mut String,
        ends: &mut Vec<usize>,
    ) -> ReadRowResult {
        use self::State::*;

        let prev = self.state;
        self.state = End;
        match prev {
            StartRecord | SkipLF | InComment | Resync | End => {
                ReadRowResult::End
            }
            StartField | InField | QuoteInQuoted => {
                ends.push(fields.len());
                ReadRowResult::Row
            }
            InQuotedField | EscapeInQuoted => ReadRowResult::Error {
                kind: ParseErrorKind::UnexpectedEndOfStream,
                field: ends.len(),
            },
        }
    }

    fn end_record(
        &mut self,
        c: char,
        fields: &str,
        ends: &mut Vec<usize>,
    ) -> Step {
        ends.push(fields.len());
        self.state = self.after_terminator(c);
        Step::Emit(ReadRowResult::Row)
    }

    fn after_terminator(&self, c: char) -> State {
        if c == '\r' {
            State::SkipLF
        } else {
            State::StartRecord
        }
    }

    #[inline(always)]
    fn transition(
        &mut self,
        c: char,
        fields: &mut String,
        ends: &mut Vec<usize>,
    ) -> Step {
        use self::State::*;

        let is_term = c == '\r' || c == '\n';
        match self.state {
            End => Step::Stay,
            SkipLF => {
                self.state = StartRecord;
                if c == '\n' {
                    Step::Consume
                } else {
                    Step::Stay
                }
            }
            StartRecord => {
                if self.comment == Some(c) {
                    self.state = InComment;
                    Step::Consume
                } else {
                    self.cur.row += 1;
                    self.row_start = self.cur;
                    self.state = StartField;
                    Step::Stay
                }
            }
            InComment | Resync => {
                if is_term {
                    self.state = self.after_terminator(c);
                }
                Step::Consume
            }
            StartField => {
                if c == self.quote {
                    self.state = InQuotedField;
                    Step::Consume
                } else if c == self.separator {
                    ends.push(fields.len());
                    Step::Consume
                } else if is_term {
                    self.end_record(c, fields, ends)
                } else {
                    fields.push(c);
                    self.state = InField;
                    Step::Consume
                }
            }
            InField => {
                if c == self.separator {
                    ends.push(fields.len());
                    self.state = StartField;
                    Step::Consume
                } else if is_term {
                    self.end_record(c, fields, ends)
                } else {
                    fields.push(c);
                    Step::Consume
                }
            }
            InQuotedField => {
                if c == self.quote {
                    self.state = QuoteInQuoted;
                } else if self.escape == Some(c) {
                    self.state = EscapeInQuoted;
                } else {
                    fields.push(c);
                }
                Step::Consume
            }
            EscapeInQuoted => {
                fields.push(c);
                self.state = InQuotedField;
                Step::Consume
            }
            QuoteInQuoted => {
                if c == self.quote {
                    fields.push(c);
                    self.state = InQuotedField;
                    Step::Consume
                } else if c == self.separator {
                    ends.push(fields.len());
                    self.state = StartField;
                    Step::Consume
                } else if is_term {
                    self.end_record(c, fields, ends)
                } else {
                    self.state = Resync;
                    Step::Emit(ReadRowResult::Error {
                        kind: ParseErrorKind::InvalidCharAfterQuote(c),
                        field: ends.len(),
                    })
                }
            }
        }
    }
}
