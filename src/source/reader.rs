//! Delimited text reader producing `RawRecord`s.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::convert::RawRecord;
use crate::error_handling::SourceError;

use super::encoding::open_decoded;

/// Streams rows of a CSV file as `RawRecord`s keyed by the declared field names.
///
/// The file has no header by default: column `n` is named by field name `n`.
/// Short rows produce records without their trailing fields and extra
/// columns are dropped. Blank lines are skipped.
///
/// Yields `Err(SourceError::Io)` at most once and then stops; malformed rows
/// yield `Err(SourceError::Malformed)` and reading continues.
pub struct CsvSource<R: Read> {
    reader: csv::Reader<R>,
    field_names: Vec<String>,
    row: StringRecord,
    done: bool,
}

impl CsvSource<Box<dyn Read + Send>> {
    /// Opens `path`, decoding from `encoding` if it is not UTF-8.
    pub fn open(
        path: &Path,
        encoding: &str,
        field_names: Vec<String>,
        skip_header: bool,
    ) -> Result<Self, SourceError> {
        let input = open_decoded(path, encoding)?;
        Ok(CsvSource::from_reader(input, field_names, skip_header))
    }
}

impl<R: Read> CsvSource<R> {
    pub fn from_reader(input: R, field_names: Vec<String>, skip_header: bool) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(skip_header)
            .flexible(true)
            .from_reader(input);
        CsvSource {
            reader,
            field_names,
            row: StringRecord::new(),
            done: false,
        }
    }
}

impl<R: Read> Iterator for CsvSource<R> {
    type Item = Result<RawRecord, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_record(&mut self.row) {
            Ok(false) => {
                self.done = true;
                None
            }
            Ok(true) => {
                let line = self.row.position().map(|p| p.line()).unwrap_or(0);
                let mut record = RawRecord::new(line);
                for (name, value) in self.field_names.iter().zip(self.row.iter()) {
                    record.insert(name.clone(), value);
                }
                Some(Ok(record))
            }
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                let reason = e.to_string();
                match e.into_kind() {
                    csv::ErrorKind::Io(io_err) => {
                        self.done = true;
                        Some(Err(SourceError::Io(io_err)))
                    }
                    _ => Some(Err(SourceError::Malformed { line, reason })),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn read_all(text: &[u8], fields: &[&str], skip_header: bool) -> Vec<Result<RawRecord, SourceError>> {
        CsvSource::from_reader(Cursor::new(text.to_vec()), names(fields), skip_header).collect()
    }

    #[test]
    fn test_reads_rows_keyed_by_field_names() {
        let rows = read_all(b"ian,22,-99.3\nann,31,4\n", &["name", "age", "price"], false);
        assert_eq!(rows.len(), 2);

        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.get("name"), Some("ian"));
        assert_eq!(first.get("age"), Some("22"));
        assert_eq!(first.get("price"), Some("-99.3"));
        assert_eq!(first.line(), 1);

        let second = rows[1].as_ref().unwrap();
        assert_eq!(second.get("name"), Some("ann"));
        assert_eq!(second.line(), 2);
    }

    #[test]
    fn test_first_row_is_data_unless_skipped() {
        let text = b"name,age\nian,22\n";
        assert_eq!(read_all(text, &["name", "age"], false).len(), 2);

        let rows = read_all(text, &["name", "age"], true);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].as_ref().unwrap().get("name"), Some("ian"));
    }

    #[test]
    fn test_short_row_leaves_fields_absent() {
        let rows = read_all(b"ian\n", &["name", "age"], false);
        let record = rows[0].as_ref().unwrap();
        assert_eq!(record.get("name"), Some("ian"));
        assert_eq!(record.get("age"), None);
    }

    #[test]
    fn test_extra_columns_dropped() {
        let rows = read_all(b"ian,22,extra\n", &["name", "age"], false);
        assert_eq!(rows[0].as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_quoted_fields_and_whitespace_preserved() {
        let rows = read_all(b"\"Smith, J\", 007 \n", &["name", "code"], false);
        let record = rows[0].as_ref().unwrap();
        assert_eq!(record.get("name"), Some("Smith, J"));
        assert_eq!(record.get("code"), Some(" 007 "));
    }

    #[test]
    fn test_invalid_utf8_row_is_malformed_and_reading_continues() {
        let rows = read_all(b"ok,1\n\xff\xfe,2\nfine,3\n", &["name", "n"], false);
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        assert!(matches!(rows[1], Err(SourceError::Malformed { .. })));
        assert_eq!(rows[2].as_ref().unwrap().get("name"), Some("fine"));
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let result = CsvSource::open(
            Path::new("/definitely/not/here.csv"),
            "UTF-8",
            names(&["a"]),
            false,
        );
        assert!(matches!(result, Err(SourceError::Io(_))));
    }
}
