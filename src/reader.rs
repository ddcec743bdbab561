use std::cmp;
use std::io;
use std::str;

use log::{debug, trace, warn};
use tabulate_core::{FormatConfig, Position, ReadRowResult, Tokenizer};

use crate::error::{Error, Result};
use crate::row::Row;

const DEFAULT_BUFFER_CAPACITY: usize = 64 * (1 << 10);

/// The smallest buffer that can always hold a partial UTF-8 sequence plus
/// at least one more byte.
const MIN_BUFFER_CAPACITY: usize = 4;

/// Builds a CSV reader with various configuration knobs.
///
/// This builder can be used to choose the dialect, the error policy and the
/// buffer size. Once a `Reader` is built, its configuration cannot be
/// changed.
#[derive(Debug)]
pub struct ReaderBuilder {
    format: FormatConfig,
    recover: bool,
    capacity: usize,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder {
            format: FormatConfig::default(),
            recover: false,
            capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl ReaderBuilder {
    /// Create a new builder for configuring CSV parsing.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a CSV reader from this configuration that reads data from
    /// `rdr`.
    ///
    /// Note that the CSV reader is buffered automatically, so you should not
    /// wrap `rdr` in a buffered reader like `io::BufReader`.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Reader<R> {
        Reader::new(self, rdr)
    }

    /// The dialect to parse.
    ///
    /// The default is `FormatConfig::default()`.
    pub fn format(&mut self, format: &FormatConfig) -> &mut ReaderBuilder {
        self.format = format.clone();
        self
    }

    /// Whether to keep reading after a malformed row.
    ///
    /// By default, this is disabled: the first parse error is returned and
    /// every read after it reports the end of data. When enabled, the error
    /// is still returned, but the reader then skips to the next record
    /// terminator and continues with the rows after it.
    ///
    /// Errors that cannot be skipped, such as I/O errors, invalid UTF-8 and
    /// data ending inside a quoted field, always end reading.
    pub fn recover(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.recover = yes;
        self
    }

    /// Set the capacity (in bytes) of the buffer used in the CSV reader.
    ///
    /// Values smaller than 4 are rounded up to 4.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut ReaderBuilder {
        self.capacity = capacity;
        self
    }
}

/// A CSV reader.
///
/// A reader pulls bytes from an underlying `io::Read` on demand and yields
/// one `Row` at a time. It blocks only while the underlying reader does.
/// Reading is forward only; to read the data again, create a new reader
/// over a fresh source.
///
/// # Example
///
/// ```
/// use tabulate::Reader;
///
/// # fn main() -> tabulate::Result<()> {
/// let data = "a,b,\"c,d\"\ne,\"f\"\"g\",h\r\n";
/// let mut rdr = Reader::from_reader(data.as_bytes());
/// let mut rows = vec![];
/// for result in rdr.rows() {
///     rows.push(result?);
/// }
/// assert_eq!(rows[0], vec!["a", "b", "c,d"]);
/// assert_eq!(rows[1], vec!["e", "f\"g", "h"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Reader<R> {
    rdr: R,
    tok: Tokenizer,
    format: FormatConfig,
    recover: bool,
    buf: Vec<u8>,
    /// Unconsumed data is `buf[start..end]`.
    start: usize,
    end: usize,
    /// The underlying reader has reported end of data.
    eof: bool,
    /// No more rows will be returned.
    done: bool,
}

impl<R: io::Read> Reader<R> {
    fn new(builder: &ReaderBuilder, rdr: R) -> Reader<R> {
        let capacity = cmp::max(MIN_BUFFER_CAPACITY, builder.capacity);
        debug!(
            "building CSV reader: separator={:?} quote={:?} escape={:?} \
             comments={:?} recover={} capacity={}",
            builder.format.separator(),
            builder.format.quote(),
            builder.format.escape(),
            builder.format.comment_marker(),
            builder.recover,
            capacity,
        );
        Reader {
            rdr,
            tok: Tokenizer::new(&builder.format),
            format: builder.format.clone(),
            recover: builder.recover,
            buf: vec![0; capacity],
            start: 0,
            end: 0,
            eof: false,
            done: false,
        }
    }

    /// Create a new CSV reader with the default dialect and fail-fast error
    /// handling.
    ///
    /// To customize parsing, use a `ReaderBuilder`.
    pub fn from_reader(rdr: R) -> Reader<R> {
        ReaderBuilder::new().from_reader(rdr)
    }

    /// Create a new CSV reader for the given dialect with fail-fast error
    /// handling.
    pub fn with_format(rdr: R, format: &FormatConfig) -> Reader<R> {
        ReaderBuilder::new().format(format).from_reader(rdr)
    }

    /// Returns a borrowed iterator over all rows.
    ///
    /// Each item yielded by this iterator is a `Result<Row, Error>`.
    pub fn rows(&mut self) -> RowsIter<R> {
        RowsIter { rdr: self }
    }

    /// Returns an owned iterator over all rows.
    pub fn into_rows(self) -> RowsIntoIter<R> {
        RowsIntoIter { rdr: self }
    }

    /// Read a single row into the given `Row`, returning `false` when no
    /// rows remain.
    ///
    /// This reuses the allocations of `row`, which makes it the fastest way
    /// to read many rows. The contents of `row` are replaced.
    ///
    /// # Errors
    ///
    /// A malformed row is reported as `Error::Parse`. Unless the reader was
    /// built with `recover(true)`, every later call returns `Ok(false)`.
    pub fn read_row(&mut self, row: &mut Row) -> Result<bool> {
        row.clear();
        if self.done {
            return Ok(false);
        }
        loop {
            let window = &self.buf[self.start..self.end];
            let input = match str::from_utf8(window) {
                Ok(input) => input,
                Err(err) => {
                    let valid = err.valid_up_to();
                    if valid == 0 {
                        if err.error_len().is_some() || self.eof {
                            return Err(self.utf8_error());
                        }
                        // Only part of a character is buffered.
                        self.fill_buf()?;
                        continue;
                    }
                    str::from_utf8(&window[..valid]).unwrap_or_default()
                }
            };
            if input.is_empty() && !self.eof {
                self.fill_buf()?;
                continue;
            }

            let (fields, ends) = row.as_parts();
            let (res, nin) = self.tok.read_row(input, fields, ends);
            self.start += nin;
            match res {
                ReadRowResult::InputEmpty => continue,
                ReadRowResult::Row => return Ok(true),
                ReadRowResult::End => {
                    trace!("end of CSV data after {} bytes", self.tok.byte());
                    self.done = true;
                    return Ok(false);
                }
                ReadRowResult::Error { kind, field } => {
                    row.clear();
                    let pos = self.tok.position();
                    warn!(
                        "malformed CSV row {} (line {}, byte {}, field {}): {}",
                        pos.row(),
                        pos.line(),
                        pos.byte(),
                        field,
                        kind
                    );
                    if self.recover && kind.is_malformed_row() {
                        debug!(
                            "skipping to the end of line {} to recover",
                            self.tok.line()
                        );
                    } else {
                        self.done = true;
                    }
                    return Err(Error::Parse { pos, field, kind });
                }
            }
        }
    }

    /// Read more data into the buffer, keeping any unconsumed bytes.
    fn fill_buf(&mut self) -> Result<()> {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        loop {
            match self.rdr.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.end += n;
                    return Ok(());
                }
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    self.done = true;
                    return Err(Error::Io(err));
                }
            }
        }
    }

    fn utf8_error(&mut self) -> Error {
        self.done = true;
        let pos = self.tok.position();
        warn!("invalid UTF-8 in CSV data at byte {}", self.tok.byte());
        Error::Utf8 { pos, byte: self.tok.byte() }
    }
}

impl<R> Reader<R> {
    /// The position of the row most recently started.
    ///
    /// Before the first row is read, this is byte `0`, line `1`, row `0`.
    pub fn position(&self) -> Position {
        self.tok.position()
    }

    /// Returns true once this reader will not return any more rows.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The dialect this reader parses.
    pub fn format(&self) -> &FormatConfig {
        &self.format
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.rdr
    }

    /// Returns a mutable reference to the underlying reader.
    ///
    /// Reading from it directly corrupts the state of this CSV reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.rdr
    }

    /// Unwraps this CSV reader, returning the underlying reader.
    ///
    /// Note that any leftover data inside this reader's internal buffer is
    /// lost.
    pub fn into_inner(self) -> R {
        self.rdr
    }
}

/// A borrowed iterator over rows.
///
/// The lifetime parameter `'r` refers to the lifetime of the underlying CSV
/// `Reader`.
pub struct RowsIter<'r, R: 'r> {
    rdr: &'r mut Reader<R>,
}

impl<'r, R: io::Read> RowsIter<'r, R> {
    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<R> {
        &self.rdr
    }
}

impl<'r, R: io::Read> Iterator for RowsIter<'r, R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        next_row(self.rdr)
    }
}

/// An owned iterator over rows.
pub struct RowsIntoIter<R> {
    rdr: Reader<R>,
}

impl<R: io::Read> RowsIntoIter<R> {
    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<R> {
        &self.rdr
    }

    /// Drop this iterator and return the underlying CSV reader.
    pub fn into_reader(self) -> Reader<R> {
        self.rdr
    }
}

impl<R: io::Read> Iterator for RowsIntoIter<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        next_row(&mut self.rdr)
    }
}

fn next_row<R: io::Read>(rdr: &mut Reader<R>) -> Option<Result<Row>> {
    let mut row = Row::new();
    match rdr.read_row(&mut row) {
        Ok(true) => Some(Ok(row)),
        Ok(false) => None,
        Err(err) => Some(Err(err)),
    }
}
