//! Pipeline orchestration
//!
//! One linear best-effort batch run:
//! connect, provision schema, clear tables, load, insert, report, release.
//! Any step's failure short-circuits the rest; the database session is
//! released on every exit path before `run` returns. No retry, no resumption.

use std::path::PathBuf;

use dorm_common::Result;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::db::{insert, schema, Database};
use crate::loader::DataLoader;
use crate::reports::{self, Reports};

/// Observable position in the linear state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Unconnected,
    Connected,
    SchemaReady,
    TablesClear,
    DataLoaded,
    DataInserted,
    Reported,
    Closed,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub rooms_loaded: usize,
    pub students_loaded: usize,
    pub reports: Reports,
}

/// Sequences one ETL run over a database session and a record loader
///
/// The loader is fixed at construction; nothing downstream branches on the
/// input format.
pub struct Pipeline<D: Database> {
    db: D,
    loader: Box<dyn DataLoader>,
    database: String,
    students_path: PathBuf,
    rooms_path: PathBuf,
    state: PipelineState,
}

impl<D: Database> Pipeline<D> {
    pub fn new(
        db: D,
        loader: Box<dyn DataLoader>,
        database: String,
        students_path: PathBuf,
        rooms_path: PathBuf,
    ) -> Self {
        Self {
            db,
            loader,
            database,
            students_path,
            rooms_path,
            state: PipelineState::Unconnected,
        }
    }

    /// Current state; `Closed` after `run` returns, success or not
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Execute the full pipeline
    ///
    /// The session is released before returning on every path, including
    /// when a step failed or the session was never established.
    pub async fn run(&mut self) -> Result<PipelineReport> {
        let outcome = self.execute_steps().await;

        if let Err(err) = &outcome {
            error!(kind = err.kind(), error = %err, "pipeline run failed");
        }
        if let Err(close_err) = self.db.close().await {
            warn!(error = %close_err, "failed to release database session");
        }
        self.transition(PipelineState::Closed);

        outcome
    }

    async fn execute_steps(&mut self) -> Result<PipelineReport> {
        self.db.connect().await?;
        self.transition(PipelineState::Connected);

        schema::initialize(&mut self.db, &self.database).await?;
        self.transition(PipelineState::SchemaReady);

        insert::clear(&mut self.db).await?;
        self.transition(PipelineState::TablesClear);

        let (students, rooms) = self.loader.load(&self.students_path, &self.rooms_path)?;
        info!(
            students = students.len(),
            rooms = rooms.len(),
            "records loaded"
        );
        self.transition(PipelineState::DataLoaded);

        insert::insert(&mut self.db, &students, &rooms).await?;
        self.transition(PipelineState::DataInserted);

        let reports = reports::run_all(&mut self.db).await?;
        self.transition(PipelineState::Reported);

        Ok(PipelineReport {
            rooms_loaded: rooms.len(),
            students_loaded: students.len(),
            reports,
        })
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = ?self.state, to = ?next, "pipeline state transition");
        self.state = next;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::db::fake::FakeDatabase;
    use crate::db::SqlValue;
    use dorm_common::{EtlError, Room, Student};
    use std::path::Path;

    struct StaticLoader {
        students: Vec<Student>,
        rooms: Vec<Room>,
    }

    impl DataLoader for StaticLoader {
        fn load(&self, _: &Path, _: &Path) -> Result<(Vec<Student>, Vec<Room>)> {
            Ok((self.students.clone(), self.rooms.clone()))
        }
    }

    struct FailingLoader;

    impl DataLoader for FailingLoader {
        fn load(&self, _: &Path, _: &Path) -> Result<(Vec<Student>, Vec<Room>)> {
            Err(EtlError::data_format("students.xml", "unclosed tag"))
        }
    }

    fn sample_loader() -> Box<dyn DataLoader> {
        Box::new(StaticLoader {
            students: vec![Student {
                id: 1,
                name: "X".to_string(),
                room_id: 1,
                birthday: chrono::NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                sex: 'M',
            }],
            rooms: vec![Room { id: 1, name: "A".to_string() }],
        })
    }

    fn pipeline_with(db: FakeDatabase, loader: Box<dyn DataLoader>) -> Pipeline<FakeDatabase> {
        Pipeline::new(
            db,
            loader,
            "dorm".to_string(),
            PathBuf::from("students.json"),
            PathBuf::from("rooms.json"),
        )
    }

    /// Scripted results for the three index probes and four reports,
    /// in the order the pipeline issues them
    fn script_fetches(db: &mut FakeDatabase) {
        for _ in 0..3 {
            db.push_rows(vec![]); // index probes: indexes absent
        }
        db.push_rows(vec![vec![SqlValue::Text("A".into()), SqlValue::Int(1)]]);
        db.push_rows(vec![vec![SqlValue::Text("A".into()), SqlValue::Float(36.0)]]);
        db.push_rows(vec![vec![SqlValue::Text("A".into()), SqlValue::Int(0)]]);
        db.push_rows(vec![]);
    }

    #[tokio::test]
    async fn test_successful_run_reaches_closed() {
        let mut db = FakeDatabase::new();
        script_fetches(&mut db);
        let mut pipeline = pipeline_with(db, sample_loader());

        let report = pipeline.run().await.unwrap();

        assert_eq!(pipeline.state(), PipelineState::Closed);
        assert_eq!(report.rooms_loaded, 1);
        assert_eq!(report.students_loaded, 1);
        assert_eq!(report.reports.occupancy.len(), 1);
        assert!(report.reports.mixed.is_empty());
    }

    #[tokio::test]
    async fn test_step_order() {
        let mut db = FakeDatabase::new();
        script_fetches(&mut db);
        let mut pipeline = pipeline_with(db, sample_loader());
        pipeline.run().await.unwrap();

        let statements = &pipeline.db.statements;
        let position = |fragment: &str| {
            statements
                .iter()
                .position(|s| s.contains(fragment))
                .unwrap_or_else(|| panic!("no statement containing '{fragment}'"))
        };

        assert!(position("CREATE DATABASE") < position("DELETE FROM students"));
        assert!(position("DELETE FROM students") < position("DELETE FROM rooms"));
        assert!(position("DELETE FROM rooms") < position("INSERT INTO rooms"));
        assert!(position("INSERT INTO rooms") < position("INSERT INTO students"));
        assert!(position("INSERT INTO students") < position("GROUP BY r.name"));
    }

    #[tokio::test]
    async fn test_connect_failure_still_closes() {
        let db = FakeDatabase::failing_on("connect");
        let mut pipeline = pipeline_with(db, sample_loader());

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, EtlError::Connection(_)));
        assert_eq!(pipeline.state(), PipelineState::Closed);
        assert_eq!(pipeline.db.close_count, 1);
        assert!(pipeline.db.statements.is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_short_circuits_and_closes() {
        let mut pipeline = pipeline_with(FakeDatabase::new(), Box::new(FailingLoader));

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, EtlError::DataFormat { .. }));
        assert_eq!(pipeline.state(), PipelineState::Closed);
        assert_eq!(pipeline.db.close_count, 1);
        // Tables were cleared, but no insert or report ran
        assert!(pipeline.db.statements.iter().any(|s| s == "DELETE FROM rooms"));
        assert!(!pipeline.db.statements.iter().any(|s| s.contains("INSERT")));
        assert!(!pipeline.db.statements.iter().any(|s| s.contains("GROUP BY")));
    }

    #[tokio::test]
    async fn test_insert_failure_short_circuits_reports() {
        let mut db = FakeDatabase::failing_on("INSERT INTO students");
        script_fetches(&mut db);
        let mut pipeline = pipeline_with(db, sample_loader());

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, EtlError::Query(_)));
        assert_eq!(pipeline.state(), PipelineState::Closed);
        // Room batch committed before the failure, no reports after it
        assert!(pipeline.db.statements.iter().any(|s| s.contains("INSERT INTO rooms")));
        assert!(!pipeline.db.statements.iter().any(|s| s.contains("GROUP BY")));
    }
}
