//! Record loading
//!
//! Parses the two input files into typed [`Student`] and [`Room`] records.
//! The two formats are interchangeable behind [`DataLoader`]; callers pick a
//! concrete loader at startup and never branch on format afterwards.
//!
//! Loaders do not cross-validate the two files: an unresolved room reference
//! is only caught by the schema's foreign key at insert time.

pub mod json;
pub mod xml;

use std::path::Path;

use dorm_common::{EtlError, Result, Room, Student};

/// Capability of loading student and room records from a pair of files
pub trait DataLoader {
    /// Parse both sources into in-memory records.
    ///
    /// # Errors
    ///
    /// - `DataFormat` - the document is malformed or a field value is
    ///   unparseable (bad birthday text, multi-character sex code)
    /// - `FieldAccess` - a record is missing a required field
    /// - `Io` - a source file could not be read
    fn load(&self, students_path: &Path, rooms_path: &Path) -> Result<(Vec<Student>, Vec<Room>)>;
}

/// Input file format, one variant per loader implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    Json,
    Xml,
}

impl InputFormat {
    /// Construct the loader for this format
    pub fn loader(self) -> Box<dyn DataLoader> {
        match self {
            InputFormat::Json => Box::new(json::JsonLoader),
            InputFormat::Xml => Box::new(xml::XmlLoader),
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Json => write!(f, "json"),
            InputFormat::Xml => write!(f, "xml"),
        }
    }
}

/// Unwrap a required field, mapping absence to `FieldAccess`
pub(crate) fn require<T>(value: Option<T>, record: &str, index: usize, field: &str) -> Result<T> {
    value.ok_or_else(|| EtlError::field_access(format!("{record} #{index}"), field))
}

/// Parse a single-character sex code
///
/// Domain membership ({M, F}) is deliberately not checked; only the shape is.
pub(crate) fn parse_sex(raw: &str, path: &Path, index: usize) -> Result<char> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(EtlError::data_format(
            path.display().to_string(),
            format!("student #{index}: sex code '{trimmed}' is not a single character"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_require_present() {
        assert_eq!(require(Some(5), "student", 0, "id").unwrap(), 5);
    }

    #[test]
    fn test_require_missing_names_record_and_field() {
        let err = require::<i64>(None, "student", 2, "room").unwrap_err();
        match err {
            EtlError::FieldAccess { record, field } => {
                assert_eq!(record, "student #2");
                assert_eq!(field, "room");
            },
            other => panic!("expected FieldAccess, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_sex_single_char() {
        let path = Path::new("students.json");
        assert_eq!(parse_sex("M", path, 0).unwrap(), 'M');
        assert_eq!(parse_sex(" F ", path, 0).unwrap(), 'F');
    }

    #[test]
    fn test_parse_sex_rejects_multi_char() {
        let path = Path::new("students.json");
        assert!(matches!(
            parse_sex("MF", path, 0),
            Err(EtlError::DataFormat { .. })
        ));
        assert!(matches!(
            parse_sex("", path, 0),
            Err(EtlError::DataFormat { .. })
        ));
    }
}
