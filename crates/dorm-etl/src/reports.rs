//! Aggregate reporting
//!
//! Four fixed read-only queries over the loaded data. Every query carries a
//! deterministic secondary sort by room name so output does not depend on
//! engine-default ordering. The engine returns typed rows only; display is
//! the caller's concern.

use dorm_common::{EtlError, Result};
use serde::Serialize;
use tracing::debug;

use crate::db::{Database, SqlValue};

/// Rooms with at least one student and their student counts,
/// descending by count
pub const OCCUPANCY_QUERY: &str = "\
SELECT r.name AS room_name,
       COUNT(s.id) AS student_count
FROM rooms AS r
         JOIN students AS s
              ON r.id = s.room_id
GROUP BY r.name
ORDER BY student_count DESC, r.name ASC";

/// Top 5 rooms by ascending average student age in whole years.
/// The aggregate is cast to DOUBLE so it decodes as a float rather than a
/// DECIMAL string.
pub const YOUNGEST_ROOMS_QUERY: &str = "\
SELECT r.name AS room_name,
       CAST(AVG(TIMESTAMPDIFF(YEAR, s.birthday, CURDATE())) AS DOUBLE) AS average_age
FROM rooms AS r
         JOIN students AS s
              ON r.id = s.room_id
GROUP BY r.name
ORDER BY average_age ASC, r.name ASC
LIMIT 5";

/// Top 5 rooms by descending difference in years between the oldest and
/// youngest student
pub const AGE_SPREAD_QUERY: &str = "\
SELECT r.name AS room_name,
       TIMESTAMPDIFF(YEAR, MIN(s.birthday), MAX(s.birthday)) AS age_difference
FROM rooms AS r
         JOIN students AS s
              ON r.id = s.room_id
GROUP BY r.name
ORDER BY age_difference DESC, r.name ASC
LIMIT 5";

/// Rooms housing more than one distinct sex code
pub const MIXED_ROOMS_QUERY: &str = "\
SELECT r.name AS room_name
FROM rooms AS r
         JOIN students AS s
              ON r.id = s.room_id
GROUP BY r.name
HAVING COUNT(DISTINCT s.sex) > 1
ORDER BY r.name ASC";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomOccupancy {
    pub room: String,
    pub students: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomAverageAge {
    pub room: String,
    pub average_age: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomAgeSpread {
    pub room: String,
    pub age_spread: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixedRoom {
    pub room: String,
}

/// Result bundle of all four reports
#[derive(Debug, Clone, Serialize)]
pub struct Reports {
    pub occupancy: Vec<RoomOccupancy>,
    pub youngest: Vec<RoomAverageAge>,
    pub age_spread: Vec<RoomAgeSpread>,
    pub mixed: Vec<MixedRoom>,
}

/// Run all four reports sequentially
pub async fn run_all<D: Database>(db: &mut D) -> Result<Reports> {
    let reports = Reports {
        occupancy: occupancy(db).await?,
        youngest: youngest_rooms(db).await?,
        age_spread: widest_age_spread(db).await?,
        mixed: mixed_rooms(db).await?,
    };
    debug!(
        occupancy = reports.occupancy.len(),
        youngest = reports.youngest.len(),
        age_spread = reports.age_spread.len(),
        mixed = reports.mixed.len(),
        "reports complete"
    );
    Ok(reports)
}

pub async fn occupancy<D: Database>(db: &mut D) -> Result<Vec<RoomOccupancy>> {
    let rows = db.fetch_all(OCCUPANCY_QUERY, &[]).await?;
    rows.iter()
        .map(|row| {
            Ok(RoomOccupancy {
                room: text_at(row, 0, "occupancy")?,
                students: int_at(row, 1, "occupancy")?,
            })
        })
        .collect()
}

pub async fn youngest_rooms<D: Database>(db: &mut D) -> Result<Vec<RoomAverageAge>> {
    let rows = db.fetch_all(YOUNGEST_ROOMS_QUERY, &[]).await?;
    rows.iter()
        .map(|row| {
            Ok(RoomAverageAge {
                room: text_at(row, 0, "youngest rooms")?,
                average_age: float_at(row, 1, "youngest rooms")?,
            })
        })
        .collect()
}

pub async fn widest_age_spread<D: Database>(db: &mut D) -> Result<Vec<RoomAgeSpread>> {
    let rows = db.fetch_all(AGE_SPREAD_QUERY, &[]).await?;
    rows.iter()
        .map(|row| {
            Ok(RoomAgeSpread {
                room: text_at(row, 0, "age spread")?,
                age_spread: int_at(row, 1, "age spread")?,
            })
        })
        .collect()
}

pub async fn mixed_rooms<D: Database>(db: &mut D) -> Result<Vec<MixedRoom>> {
    let rows = db.fetch_all(MIXED_ROOMS_QUERY, &[]).await?;
    rows.iter()
        .map(|row| {
            Ok(MixedRoom {
                room: text_at(row, 0, "mixed rooms")?,
            })
        })
        .collect()
}

fn text_at(row: &[SqlValue], idx: usize, report: &str) -> Result<String> {
    row.get(idx)
        .and_then(SqlValue::as_text)
        .map(str::to_string)
        .ok_or_else(|| column_shape_error(row, idx, report))
}

fn int_at(row: &[SqlValue], idx: usize, report: &str) -> Result<i64> {
    row.get(idx)
        .and_then(SqlValue::as_int)
        .ok_or_else(|| column_shape_error(row, idx, report))
}

fn float_at(row: &[SqlValue], idx: usize, report: &str) -> Result<f64> {
    row.get(idx)
        .and_then(SqlValue::as_float)
        .ok_or_else(|| column_shape_error(row, idx, report))
}

fn column_shape_error(row: &[SqlValue], idx: usize, report: &str) -> EtlError {
    EtlError::Query(format!(
        "unexpected column {idx} shape in {report} report row: {row:?}"
    ))
}
