//! Dorm ETL Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the dorm-etl workspace.
//!
//! # Overview
//!
//! This crate provides the functionality used across all workspace members:
//!
//! - **Error Handling**: the pipeline-wide error taxonomy and result alias
//! - **Logging**: tracing subscriber configuration and initialization
//! - **Types**: the `Student` and `Room` domain records

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{EtlError, Result};
pub use types::{Room, Student};
