//! Dorm ETL Library
//!
//! Batch pipeline that loads student/room records from JSON or XML files,
//! provisions a MySQL schema, bulk-inserts the records, and runs four
//! aggregate reports over the result.
//!
//! # Pipeline
//!
//! ```no_run
//! use dorm_etl::config::DatabaseConfig;
//! use dorm_etl::db::mysql::MySqlDatabase;
//! use dorm_etl::loader::json::JsonLoader;
//! use dorm_etl::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> dorm_common::Result<()> {
//!     let config = DatabaseConfig::from_env()?;
//!     let db = MySqlDatabase::new(config.clone());
//!     let mut pipeline = Pipeline::new(
//!         db,
//!         Box::new(JsonLoader),
//!         config.database,
//!         "students.json".into(),
//!         "rooms.json".into(),
//!     );
//!     let report = pipeline.run().await?;
//!     println!("{} rooms occupied", report.reports.occupancy.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod loader;
pub mod pipeline;
pub mod reports;
