//! Database access
//!
//! [`Database`] is the capability set the pipeline needs from a relational
//! engine: connect, execute, batched execute, fetch, close. The pipeline is
//! generic over it; [`mysql::MySqlDatabase`] is the one production adapter
//! and the tests substitute an in-memory double.

pub mod insert;
pub mod mysql;
pub mod schema;

#[cfg(test)]
pub(crate) mod fake;

use chrono::{NaiveDate, NaiveDateTime};
use dorm_common::Result;

/// A statement parameter or result cell
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

impl SqlValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric cell as f64; integer cells widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SqlValue::Float(v) => Some(*v),
            SqlValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// Scoped handle to a relational database session
///
/// One pipeline run owns exactly one session for its whole lifetime; there is
/// no sharing across callers and no retry inside the adapter.
#[allow(async_fn_in_trait)]
pub trait Database {
    /// Establish the session.
    ///
    /// # Errors
    ///
    /// `Connection` when the target is unreachable or credentials are rejected.
    async fn connect(&mut self) -> Result<()>;

    /// Run one statement, optionally parameterized. Returns affected rows.
    ///
    /// # Errors
    ///
    /// `Query` on statement failure, `Constraint` on a constraint violation.
    async fn execute(&mut self, statement: &str, params: &[SqlValue]) -> Result<u64>;

    /// Run one parameterized statement once per row as a single transaction.
    ///
    /// On any row's failure the whole batch is rolled back and the error
    /// re-raised; on success the batch commits as one unit.
    async fn execute_many(&mut self, statement: &str, rows: &[Vec<SqlValue>]) -> Result<u64>;

    /// Run a query and return every result row in declared column order.
    async fn fetch_all(
        &mut self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<Vec<Vec<SqlValue>>>;

    /// Release the session. No-op when never connected; safe to call twice.
    async fn close(&mut self) -> Result<()>;
}
