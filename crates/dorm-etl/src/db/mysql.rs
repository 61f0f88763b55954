//! MySQL adapter over a single sqlx connection
//!
//! The pipeline is a sequential batch job, so this adapter holds one
//! `MySqlConnection` rather than a pool. Unparameterized statements go
//! through `sqlx::raw_sql` because `USE` and most DDL cannot be prepared.

use chrono::{NaiveDate, NaiveDateTime};
use dorm_common::{EtlError, Result};
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Row, TypeInfo, ValueRef};
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

use super::{Database, SqlValue};

/// Scoped MySQL session
pub struct MySqlDatabase {
    config: DatabaseConfig,
    conn: Option<MySqlConnection>,
}

impl MySqlDatabase {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config, conn: None }
    }

    fn conn(&mut self) -> Result<&mut MySqlConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| EtlError::Connection("not connected".to_string()))
    }
}

impl Database for MySqlDatabase {
    async fn connect(&mut self) -> Result<()> {
        // Connect without a database path segment: the target database may
        // not exist yet and is provisioned by the schema initializer.
        let conn = MySqlConnection::connect(&self.config.server_url())
            .await
            .map_err(|e| EtlError::Connection(e.to_string()))?;
        self.conn = Some(conn);
        debug!(host = %self.config.host, port = self.config.port, "database session established");
        Ok(())
    }

    async fn execute(&mut self, statement: &str, params: &[SqlValue]) -> Result<u64> {
        let conn = self.conn()?;
        if params.is_empty() {
            let result = sqlx::raw_sql(statement)
                .execute(&mut *conn)
                .await
                .map_err(map_query_error)?;
            Ok(result.rows_affected())
        } else {
            let result = bind_params(sqlx::query(statement), params)
                .execute(&mut *conn)
                .await
                .map_err(map_query_error)?;
            Ok(result.rows_affected())
        }
    }

    async fn execute_many(&mut self, statement: &str, rows: &[Vec<SqlValue>]) -> Result<u64> {
        let conn = self.conn()?;
        let mut tx = conn.begin().await.map_err(map_query_error)?;

        let mut affected = 0u64;
        for row in rows {
            match bind_params(sqlx::query(statement), row)
                .execute(&mut *tx)
                .await
            {
                Ok(result) => affected += result.rows_affected(),
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(error = %rollback_err, "rollback after batch failure also failed");
                    }
                    return Err(map_query_error(err));
                },
            }
        }

        tx.commit().await.map_err(map_query_error)?;
        Ok(affected)
    }

    async fn fetch_all(
        &mut self,
        statement: &str,
        params: &[SqlValue],
    ) -> Result<Vec<Vec<SqlValue>>> {
        let conn = self.conn()?;
        let rows = bind_params(sqlx::query(statement), params)
            .fetch_all(&mut *conn)
            .await
            .map_err(map_query_error)?;

        rows.iter().map(decode_row).collect()
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|e| EtlError::Connection(e.to_string()))?;
            debug!("database session released");
        }
        Ok(())
    }
}

fn bind_params<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    params: &'q [SqlValue],
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    params.iter().fold(query, |q, value| match value {
        SqlValue::Int(v) => q.bind(*v),
        SqlValue::Float(v) => q.bind(*v),
        SqlValue::Text(v) => q.bind(v.as_str()),
        SqlValue::Date(v) => q.bind(*v),
        SqlValue::DateTime(v) => q.bind(*v),
        SqlValue::Null => q.bind(None::<String>),
    })
}

/// Map a driver error into the pipeline taxonomy, surfacing foreign-key and
/// uniqueness breaches as their own kind
fn map_query_error(error: sqlx::Error) -> EtlError {
    if let sqlx::Error::Database(ref db_err) = error {
        if db_err.is_foreign_key_violation() || db_err.is_unique_violation() {
            return EtlError::Constraint(db_err.to_string());
        }
    }
    EtlError::Query(error.to_string())
}

fn decode_row(row: &MySqlRow) -> Result<Vec<SqlValue>> {
    let mut values = Vec::with_capacity(row.columns().len());
    for (idx, column) in row.columns().iter().enumerate() {
        values.push(decode_value(row, idx, column.type_info().name())?);
    }
    Ok(values)
}

/// Convert one MySQL cell into a `SqlValue`
fn decode_value(row: &MySqlRow, idx: usize, type_name: &str) -> Result<SqlValue> {
    if row.try_get_raw(idx).map_err(map_query_error)?.is_null() {
        return Ok(SqlValue::Null);
    }

    let value = match type_name {
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "TINYINT UNSIGNED"
        | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED" | "BIGINT UNSIGNED" => {
            SqlValue::Int(row.try_get::<i64, _>(idx).map_err(map_query_error)?)
        },
        "FLOAT" | "DOUBLE" => SqlValue::Float(row.try_get::<f64, _>(idx).map_err(map_query_error)?),
        "DECIMAL" => {
            // Decimals arrive as text; the report queries cast their
            // aggregates to DOUBLE, so this path only covers ad-hoc queries.
            let raw: String = row.try_get(idx).map_err(map_query_error)?;
            let parsed = raw
                .parse::<f64>()
                .map_err(|e| EtlError::Query(format!("unparseable DECIMAL '{raw}': {e}")))?;
            SqlValue::Float(parsed)
        },
        "DATE" => SqlValue::Date(row.try_get::<NaiveDate, _>(idx).map_err(map_query_error)?),
        "DATETIME" | "TIMESTAMP" => {
            SqlValue::DateTime(row.try_get::<NaiveDateTime, _>(idx).map_err(map_query_error)?)
        },
        _ => {
            // VARCHAR, CHAR, TEXT and anything else that decodes as text
            SqlValue::Text(row.try_get::<String, _>(idx).map_err(map_query_error)?)
        },
    };

    Ok(value)
}
