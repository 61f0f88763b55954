//! Domain types shared across the workspace

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A student record loaded from an input file
///
/// `room_id` must reference an existing [`Room`] at insert time; the schema's
/// foreign key enforces this, the loader does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub room_id: i64,
    pub birthday: NaiveDate,
    /// Single-character sex code; {M, F} expected but not enforced
    pub sex: char,
}

/// A room record loaded from an input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
}
