/*!
`tabulate-core` provides a push based CSV tokenizer and field encoder.

This crate performs no I/O and allocates only into buffers provided by the
caller. Both the `Tokenizer` and the `Encoder` are driven by a
`FormatConfig`, an immutable description of a CSV dialect that is built and
checked once with a `FormatConfigBuilder`.

Most users want the `tabulate` crate instead, which wraps these types in
convenient readers and writers over `std::io`.

# Example

```
use tabulate_core::{FormatConfig, ReadRowResult, Tokenizer};

let cfg = FormatConfig::default();
let mut tok = Tokenizer::new(&cfg);
let (mut fields, mut ends) = (String::new(), vec![]);

let (res, nin) = tok.read_row("a,\"b,c\"\nd", &mut fields, &mut ends);
assert_eq!(res, ReadRowResult::Row);
assert_eq!(nin, 8);
assert_eq!(fields, "ab,c");
assert_eq!(ends, vec![1, 4]);
```
*/

#![deny(missing_docs)]

pub use crate::config::{
    ConfigError, EscapeMode, FormatConfig, FormatConfigBuilder, LineTerminator,
};
pub use crate::encoder::Encoder;
pub use crate::tokenizer::{ParseErrorKind, Position, ReadRowResult, Tokenizer};

mod config;
mod encoder;
mod tokenizer;
