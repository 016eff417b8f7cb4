//! On-the-fly transcoding of non-UTF-8 input to UTF-8.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use encoding_rs_io::{DecodeReaderBytes, DecodeReaderBytesBuilder};

use crate::config::DECODE_BUFFER_SIZE;
use crate::error_handling::SourceError;

/// Resolves an encoding label such as `UTF-8`, `cp1252` or `latin1`.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, SourceError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| SourceError::UnknownEncoding(label.to_string()))
}

/// Opens `path` and returns a reader that yields UTF-8 bytes.
///
/// UTF-8 files are passed through untouched; anything else goes through
/// `decode_reader`.
pub fn open_decoded(path: &Path, label: &str) -> Result<Box<dyn Read + Send>, SourceError> {
    let encoding = resolve_encoding(label)?;
    let file = File::open(path)?;
    if encoding == UTF_8 {
        Ok(Box::new(file))
    } else {
        log::debug!("Decoding {} as {}", path.display(), encoding.name());
        Ok(Box::new(decode_reader(file, encoding)?))
    }
}

/// Wraps `inner` so reads yield UTF-8 decoded from `encoding`.
///
/// Malformed byte sequences are replaced with U+FFFD. A leading BOM is
/// honoured and stripped.
pub fn decode_reader<R: Read>(
    inner: R,
    encoding: &'static Encoding,
) -> io::Result<DecodeReaderBytes<R, Vec<u8>>> {
    DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .build_with_buffer(inner, vec![0; DECODE_BUFFER_SIZE])
}
