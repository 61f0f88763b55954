//! JSON record loader

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use dorm_common::{EtlError, Result, Room, Student};
use serde::Deserialize;

use super::{parse_sex, require, DataLoader};

/// Textual birthday pattern carried by JSON student records,
/// e.g. `2002-03-14T00:00:00.000000`
const BIRTHDAY_PATTERN: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Loads records from JSON files holding arrays of objects
pub struct JsonLoader;

/// Raw student object; all fields optional so absence is reported as a
/// missing-field error rather than a serde failure
#[derive(Debug, Deserialize)]
struct RawStudent {
    id: Option<i64>,
    name: Option<String>,
    room: Option<i64>,
    birthday: Option<String>,
    sex: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRoom {
    id: Option<i64>,
    name: Option<String>,
}

impl DataLoader for JsonLoader {
    fn load(&self, students_path: &Path, rooms_path: &Path) -> Result<(Vec<Student>, Vec<Room>)> {
        let students = load_students(students_path)?;
        let rooms = load_rooms(rooms_path)?;
        Ok((students, rooms))
    }
}

fn parse_array<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| EtlError::data_format(path.display().to_string(), e.to_string()))
}

fn load_students(path: &Path) -> Result<Vec<Student>> {
    let raw: Vec<RawStudent> = parse_array(path)?;

    raw.into_iter()
        .enumerate()
        .map(|(i, record)| {
            let birthday_text = require(record.birthday, "student", i, "birthday")?;
            let sex_text = require(record.sex, "student", i, "sex")?;
            Ok(Student {
                id: require(record.id, "student", i, "id")?,
                name: require(record.name, "student", i, "name")?,
                room_id: require(record.room, "student", i, "room")?,
                birthday: parse_birthday(&birthday_text, path, i)?,
                sex: parse_sex(&sex_text, path, i)?,
            })
        })
        .collect()
}

fn load_rooms(path: &Path) -> Result<Vec<Room>> {
    let raw: Vec<RawRoom> = parse_array(path)?;

    raw.into_iter()
        .enumerate()
        .map(|(i, record)| {
            Ok(Room {
                id: require(record.id, "room", i, "id")?,
                name: require(record.name, "room", i, "name")?,
            })
        })
        .collect()
}

fn parse_birthday(raw: &str, path: &Path, index: usize) -> Result<NaiveDate> {
    NaiveDateTime::parse_from_str(raw.trim(), BIRTHDAY_PATTERN)
        .map(|dt| dt.date())
        .map_err(|e| {
            EtlError::data_format(
                path.display().to_string(),
                format!("student #{index}: birthday '{raw}' does not match {BIRTHDAY_PATTERN}: {e}"),
            )
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const STUDENTS: &str = r#"[
        {"id": 1, "name": "Xavier", "room": 1, "birthday": "1990-01-01T00:00:00.000000", "sex": "M"},
        {"id": 2, "name": "Yara", "room": 1, "birthday": "2000-06-15T12:30:00.000000", "sex": "F"}
    ]"#;

    const ROOMS: &str = r#"[
        {"id": 1, "name": "Room A"},
        {"id": 2, "name": "Room B"}
    ]"#;

    #[test]
    fn test_load_preserves_all_fields() {
        let students_file = write_file(STUDENTS);
        let rooms_file = write_file(ROOMS);

        let (students, rooms) = JsonLoader
            .load(students_file.path(), rooms_file.path())
            .unwrap();

        assert_eq!(students.len(), 2);
        assert_eq!(students[0].id, 1);
        assert_eq!(students[0].name, "Xavier");
        assert_eq!(students[0].room_id, 1);
        assert_eq!(
            students[0].birthday,
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()
        );
        assert_eq!(students[0].sex, 'M');
        assert_eq!(students[1].sex, 'F');

        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[1], Room { id: 2, name: "Room B".to_string() });
    }

    #[test]
    fn test_malformed_json_is_data_format_error() {
        let students_file = write_file("[{\"id\": 1,");
        let rooms_file = write_file(ROOMS);

        let err = JsonLoader
            .load(students_file.path(), rooms_file.path())
            .unwrap_err();
        assert!(matches!(err, EtlError::DataFormat { .. }));
    }

    #[test]
    fn test_missing_key_is_field_access_error() {
        let students_file = write_file(
            r#"[{"id": 1, "name": "Xavier", "room": 1, "sex": "M"}]"#,
        );
        let rooms_file = write_file(ROOMS);

        let err = JsonLoader
            .load(students_file.path(), rooms_file.path())
            .unwrap_err();
        match err {
            EtlError::FieldAccess { record, field } => {
                assert_eq!(record, "student #0");
                assert_eq!(field, "birthday");
            },
            other => panic!("expected FieldAccess, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_birthday_pattern_is_data_format_error() {
        let students_file = write_file(
            r#"[{"id": 1, "name": "Xavier", "room": 1, "birthday": "01/01/1990", "sex": "M"}]"#,
        );
        let rooms_file = write_file(ROOMS);

        let err = JsonLoader
            .load(students_file.path(), rooms_file.path())
            .unwrap_err();
        assert!(matches!(err, EtlError::DataFormat { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let rooms_file = write_file(ROOMS);
        let err = JsonLoader
            .load(Path::new("/nonexistent/students.json"), rooms_file.path())
            .unwrap_err();
        assert!(matches!(err, EtlError::Io(_)));
    }
}
