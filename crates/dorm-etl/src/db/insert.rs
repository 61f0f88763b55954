//! Transactional bulk insertion
//!
//! Rooms go in first as one batch, then students as one batch: the students
//! table holds a foreign key into rooms. Each batch commits or rolls back as
//! a unit, but the two batches are independent transactions, so a failing
//! student batch leaves an already-committed room batch in place.

use dorm_common::{Result, Room, Student};
use tracing::{debug, warn};

use super::{Database, SqlValue};

const INSERT_ROOM: &str = "INSERT INTO rooms (id, name) VALUES (?, ?)";

const INSERT_STUDENT: &str =
    "INSERT INTO students (id, name, room_id, birthday, sex) VALUES (?, ?, ?, ?, ?)";

/// Insert all rooms, then all students, one batch per entity type
pub async fn insert<D: Database>(db: &mut D, students: &[Student], rooms: &[Room]) -> Result<()> {
    let room_rows: Vec<Vec<SqlValue>> = rooms.iter().map(room_row).collect();
    db.execute_many(INSERT_ROOM, &room_rows).await?;
    debug!(rooms = rooms.len(), "room batch committed");

    let student_rows: Vec<Vec<SqlValue>> = students.iter().map(student_row).collect();
    if let Err(err) = db.execute_many(INSERT_STUDENT, &student_rows).await {
        // The room batch has already committed at this point.
        warn!(error = %err, "student batch failed; room batch remains committed");
        return Err(err);
    }
    debug!(students = students.len(), "student batch committed");

    Ok(())
}

/// Delete all rows, children before parents, for idempotent re-runs
pub async fn clear<D: Database>(db: &mut D) -> Result<()> {
    db.execute("DELETE FROM students", &[]).await?;
    db.execute("DELETE FROM rooms", &[]).await?;
    debug!("tables cleared");
    Ok(())
}

fn room_row(room: &Room) -> Vec<SqlValue> {
    vec![SqlValue::Int(room.id), SqlValue::Text(room.name.clone())]
}

fn student_row(student: &Student) -> Vec<SqlValue> {
    vec![
        SqlValue::Int(student.id),
        SqlValue::Text(student.name.clone()),
        SqlValue::Int(student.room_id),
        SqlValue::Date(student.birthday),
        SqlValue::Text(student.sex.to_string()),
    ]
}
