use std::io;

use log::debug;
use tabulate_core::{Encoder, FormatConfig};

use crate::error::Result;

/// Builds a CSV writer with various configuration knobs.
///
/// This builder can be used to choose the dialect and how rows are framed
/// by record terminators. Once a `Writer` is built, its configuration cannot
/// be changed.
#[derive(Debug)]
pub struct WriterBuilder {
    format: FormatConfig,
    trailing_terminator: bool,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder {
            format: FormatConfig::default(),
            trailing_terminator: true,
        }
    }
}

impl WriterBuilder {
    /// Create a new builder for configuring CSV writing.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// Build a CSV writer from this configuration that writes data to `wtr`.
    ///
    /// Each row is handed to `wtr` with a single `write_all` call; wrap `wtr`
    /// in an `io::BufWriter` if that is too many calls for it.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Writer<W> {
        Writer::new(self, wtr)
    }

    /// The dialect to write.
    ///
    /// The default is `FormatConfig::default()`.
    pub fn format(&mut self, format: &FormatConfig) -> &mut WriterBuilder {
        self.format = format.clone();
        self
    }

    /// Whether every row is followed by a record terminator.
    ///
    /// This is enabled by default. When disabled, terminators are written
    /// between rows, so the last row written has no terminator unless
    /// `Writer::write_terminator` is called.
    pub fn trailing_terminator(&mut self, yes: bool) -> &mut WriterBuilder {
        self.trailing_terminator = yes;
        self
    }
}

/// A CSV writer.
///
/// A writer serializes rows of strings, quoting fields only when necessary
/// and writing the record terminator of its dialect, which is `\r\n` by
/// default on every platform.
///
/// Writes are not transactional: if writing a row fails, whatever part of it
/// the underlying writer accepted stays written.
///
/// # Example
///
/// ```
/// use tabulate::Writer;
///
/// # fn main() -> tabulate::Result<()> {
/// let mut wtr = Writer::from_writer(vec![]);
/// wtr.write_row(&["x", "y,z"])?;
/// wtr.write_row(vec!["say \"hi\"".to_string()])?;
///
/// let data = String::from_utf8(wtr.into_inner()?).unwrap();
/// assert_eq!(data, "x,\"y,z\"\r\n\"say \"\"hi\"\"\"\r\n");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    wtr: W,
    enc: Encoder,
    format: FormatConfig,
    trailing_terminator: bool,
    /// A terminator is owed before the next row.
    pending_terminator: bool,
    buf: String,
}

impl<W: io::Write> Writer<W> {
    fn new(builder: &WriterBuilder, wtr: W) -> Writer<W> {
        debug!(
            "building CSV writer: separator={:?} quote={:?} escape={:?} \
             terminator={:?} trailing_terminator={}",
            builder.format.separator(),
            builder.format.quote(),
            builder.format.escape(),
            builder.format.line_terminator(),
            builder.trailing_terminator,
        );
        Writer {
            wtr,
            enc: Encoder::new(&builder.format),
            format: builder.format.clone(),
            trailing_terminator: builder.trailing_terminator,
            pending_terminator: false,
            buf: String::new(),
        }
    }

    /// Create a new CSV writer with the default dialect.
    ///
    /// To customize writing, use a `WriterBuilder`.
    pub fn from_writer(wtr: W) -> Writer<W> {
        WriterBuilder::new().from_writer(wtr)
    }

    /// Create a new CSV writer for the given dialect.
    pub fn with_format(wtr: W, format: &FormatConfig) -> Writer<W> {
        WriterBuilder::new().format(format).from_writer(wtr)
    }

    /// Write a single row.
    ///
    /// A row is any iterator of fields, where each field is anything that
    /// can be viewed as a `&str`: a `Row`, a `Vec<String>`, a slice of
    /// `&str` and so on. Rows may have different lengths.
    pub fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.buf.clear();
        if self.pending_terminator {
            self.enc.terminator(&mut self.buf);
        }
        for field in row {
            self.enc.field(field.as_ref(), &mut self.buf);
        }
        self.enc.finish_row(&mut self.buf);
        if self.trailing_terminator {
            self.enc.terminator(&mut self.buf);
        }
        self.pending_terminator = !self.trailing_terminator;
        self.wtr.write_all(self.buf.as_bytes())?;
        Ok(())
    }

    /// Write every row yielded by `rows`.
    ///
    /// This stops at the first error.
    pub fn write_rows<I>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: IntoIterator,
        <I::Item as IntoIterator>::Item: AsRef<str>,
    {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Write a record terminator.
    ///
    /// Without trailing terminators, this ends the last row written. With
    /// them, it writes an empty line, which reads back as a row with one
    /// empty field.
    pub fn write_terminator(&mut self) -> Result<()> {
        self.buf.clear();
        self.enc.terminator(&mut self.buf);
        self.pending_terminator = false;
        self.wtr.write_all(self.buf.as_bytes())?;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.wtr.flush()?;
        Ok(())
    }

    /// The dialect this writer produces.
    pub fn format(&self) -> &FormatConfig {
        &self.format
    }

    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.wtr
    }

    /// Flush and unwrap this CSV writer, returning the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.wtr)
    }
}
