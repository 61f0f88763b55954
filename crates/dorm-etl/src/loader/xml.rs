//! XML record loader
//!
//! Expects documents with a root element holding repeated `<student>` or
//! `<room>` children, e.g.
//!
//! ```xml
//! <students>
//!     <student>
//!         <id>1</id>
//!         <name>Xavier</name>
//!         <room>1</room>
//!         <birthday>1990-01-01</birthday>
//!         <sex>M</sex>
//!     </student>
//! </students>
//! ```

use std::path::Path;

use chrono::NaiveDate;
use dorm_common::{EtlError, Result, Room, Student};
use serde::Deserialize;

use super::{parse_sex, require, DataLoader};

/// Loads records from XML documents
pub struct XmlLoader;

#[derive(Debug, Deserialize)]
struct StudentsDocument {
    #[serde(rename = "student", default)]
    students: Vec<RawStudent>,
}

#[derive(Debug, Deserialize)]
struct RoomsDocument {
    #[serde(rename = "room", default)]
    rooms: Vec<RawRoom>,
}

/// Raw student element; children optional so a missing child surfaces as a
/// missing-field error, not a deserializer failure
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

impl DataLoader for XmlLoader {
    fn load(&self, students_path: &Path, rooms_path: &Path) -> Result<(Vec<Student>, Vec<Room>)> {
        let students = load_students(students_path)?;
        let rooms = load_rooms(rooms_path)?;
        Ok((students, rooms))
    }
}

fn parse_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    quick_xml::de::from_str(&content).map_err(|e| {
        EtlError::data_format(
            path.display().to_string(),
            format!("Error parsing XML file: {e}"),
        )
    })
}

fn load_students(path: &Path) -> Result<Vec<Student>> {
    let document: StudentsDocument = parse_document(path)?;

    document
        .students
        .into_iter()
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
    let document: RoomsDocument = parse_document(path)?;

    document
        .rooms
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            Ok(Room {
                id: require(record.id, "room", i, "id")?,
                name: require(record.name, "room", i, "name")?,
            })
        })
        .collect()
}

/// XML birthdays are plain `YYYY-MM-DD` date strings
fn parse_birthday(raw: &str, path: &Path, index: usize) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        EtlError::data_format(
            path.display().to_string(),
            format!("student #{index}: birthday '{raw}' is not a YYYY-MM-DD date: {e}"),
        )
    })
}
