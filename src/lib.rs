/*!
Streaming reading and writing of CSV data as rows of strings.

Data is parsed one row at a time from any `io::Read`, so inputs larger than
memory are fine, and written one row at a time to any `io::Write`. Every
reader and writer follows a `FormatConfig`, which names the separator, quote
and escape characters, the record terminator to write and whether comment
lines are skipped.

```
use tabulate::{FormatConfig, Row};

# fn main() -> tabulate::Result<()> {
let cfg = FormatConfig::semicolon();
let rows = vec![vec!["id", "note"], vec!["1", "a;b"]];

let mut data = vec![];
tabulate::write(&rows, &mut data, &cfg)?;
assert_eq!(data, b"id;note\r\n1;\"a;b\"\r\n");

let parsed: Vec<Row> = tabulate::tokenize(&data[..], &cfg)
    .collect::<tabulate::Result<_>>()?;
assert_eq!(parsed, rows.iter().map(|r| Row::from(&r[..])).collect::<Vec<_>>());
# Ok(())
# }
```
*/

#![deny(missing_docs)]

use std::io;

pub use tabulate_core::{
    ConfigError, EscapeMode, FormatConfig, FormatConfigBuilder, LineTerminator,
    ParseErrorKind, Position,
};

pub use crate::error::{Error, ErrorKind, Result};
pub use crate::reader::{Reader, ReaderBuilder, RowsIntoIter, RowsIter};
pub use crate::row::{Row, RowIter};
pub use crate::writer::{Writer, WriterBuilder};

mod error;
mod reader;
mod row;
mod writer;

/// Parse `source` lazily into rows.
///
/// This is shorthand for `Reader::with_format(source, format).into_rows()`.
/// Reading stops at the first error.
pub fn tokenize<R: io::Read>(
    source: R,
    format: &FormatConfig,
) -> RowsIntoIter<R> {
    Reader::with_format(source, format).into_rows()
}

/// Write every row in `rows` to `sink`, each followed by a record terminator.
///
/// `sink` is flushed once all rows are written.
pub fn write<I, W>(rows: I, sink: W, format: &FormatConfig) -> Result<()>
where
    I: IntoIterator,
    I::Item: IntoIterator,
    <I::Item as IntoIterator>::Item: AsRef<str>,
    W: io::Write,
{
    let mut wtr = Writer::with_format(sink, format);
    wtr.write_rows(rows)?;
    wtr.flush()
}
