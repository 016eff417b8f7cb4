//! Source stream: reads the input file record by record.

mod encoding;
mod reader;

pub use encoding::{decode_reader, open_decoded, resolve_encoding};
pub use reader::CsvSource;
