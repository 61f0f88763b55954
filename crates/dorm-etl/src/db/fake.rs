//! In-memory `Database` double for unit tests
//!
//! Records every statement and batch, serves scripted fetch results in
//! order, and can be told to fail on any statement containing a fragment.

use std::collections::VecDeque;

use dorm_common::{EtlError, Result};

use super::{Database, SqlValue};

#[derive(Default)]
pub(crate) struct FakeDatabase {
    /// Every statement in execution order (execute, execute_many, fetch_all)
    pub statements: Vec<String>,
    /// Batches handed to `execute_many`, with their rows
    pub batches: Vec<(String, Vec<Vec<SqlValue>>)>,
    /// Scripted `fetch_all` results, consumed front to back
    pub fetch_results: VecDeque<Vec<Vec<SqlValue>>>,
    /// Fail any statement containing this fragment ("connect" fails connect)
    pub fail_on: Option<String>,
    pub connected: bool,
    pub close_count: usize,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(fragment: &str) -> Self {
        Self {
            fail_on: Some(fragment.to_string()),
            ..Self::default()
        }
    }

    pub fn push_rows(&mut self, rows: Vec<Vec<SqlValue>>) {
        self.fetch_results.push_back(rows);
    }

    fn check(&self, statement: &str) -> Result<()> {
        if let Some(fragment) = &self.fail_on {
            if statement.contains(fragment.as_str()) {
                return Err(EtlError::Query(format!(
                    "forced failure on '{fragment}'"
                )));
            }
        }
        Ok(())
    }
}

impl Database for FakeDatabase {
    async fn connect(&mut self) -> Result<()> {
        if self.fail_on.as_deref() == Some("connect") {
            return Err(EtlError::Connection("forced connect failure".to_string()));
        }
        self.connected = true;
        Ok(())
    }

    async fn execute(&mut self, statement: &str, _params: &[SqlValue]) -> Result<u64> {
        self.check(statement)?;
        self.statements.push(statement.to_string());
        Ok(0)
    }

    async fn execute_many(&mut self, statement: &str, rows: &[Vec<SqlValue>]) -> Result<u64> {
        self.check(statement)?;
        self.statements.push(statement.to_string());
        self.batches.push((statement.to_string(), rows.to_vec()));
        Ok(rows.len() as u64)
    }

    async fn fetch_all(
        &mut self,
        statement: &str,
        _params: &[SqlValue],
    ) -> Result<Vec<Vec<SqlValue>>> {
        self.check(statement)?;
        self.statements.push(statement.to_string());
        Ok(self.fetch_results.pop_front().unwrap_or_default())
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.close_count += 1;
        Ok(())
    }
}
