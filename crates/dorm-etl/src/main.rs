//! Dorm ETL - student/room ingestion and reporting tool

use std::path::PathBuf;

use clap::Parser;
use dorm_common::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use dorm_common::EtlError;
use dorm_etl::config::{DatabaseConfig, DEFAULT_DB_HOST, DEFAULT_DB_NAME, DEFAULT_DB_PORT};
use dorm_etl::db::mysql::MySqlDatabase;
use dorm_etl::loader::InputFormat;
use dorm_etl::pipeline::{Pipeline, PipelineReport};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "dorm-etl")]
#[command(author, version, about = "Load student/room records into MySQL and run aggregate reports")]
struct Cli {
    /// Students input file
    #[arg(long, default_value = "students.json")]
    students: PathBuf,

    /// Rooms input file
    #[arg(long, default_value = "rooms.json")]
    rooms: PathBuf,

    /// Input file format
    #[arg(long, value_enum, default_value_t = InputFormat::Json)]
    format: InputFormat,

    /// Emit the report bundle as JSON instead of plain rows
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Database host
    #[arg(long, env = "DORM_DB_HOST", default_value = DEFAULT_DB_HOST)]
    db_host: String,

    /// Database port
    #[arg(long, env = "DORM_DB_PORT", default_value_t = DEFAULT_DB_PORT)]
    db_port: u16,

    /// Database user
    #[arg(long, env = "DORM_DB_USER")]
    db_user: String,

    /// Database password
    #[arg(long, env = "DORM_DB_PASSWORD", default_value = "", hide_env_values = true)]
    db_password: String,

    /// Database name, created on first run if absent
    #[arg(long, env = "DORM_DB_NAME", default_value = DEFAULT_DB_NAME)]
    db_name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|f| f.parse().ok())
        .unwrap_or(LogFormat::Text);
    init_logging(&LogConfig::new(log_level, log_format))?;

    let config = DatabaseConfig {
        host: cli.db_host,
        port: cli.db_port,
        user: cli.db_user,
        password: cli.db_password,
        database: cli.db_name,
    };

    info!(
        students = %cli.students.display(),
        rooms = %cli.rooms.display(),
        format = ?cli.format,
        database = %config.database,
        "starting pipeline run"
    );

    let db = MySqlDatabase::new(config.clone());
    let mut pipeline = Pipeline::new(
        db,
        cli.format.loader(),
        config.database,
        cli.students,
        cli.rooms,
    );

    match pipeline.run().await {
        Ok(report) => {
            display_report(&report, cli.json)?;
            Ok(())
        },
        Err(err) => {
            report_failure(&err);
            std::process::exit(1);
        },
    }
}

/// One descriptive message per failure kind; the run exits without
/// completing the remaining pipeline states.
fn report_failure(err: &EtlError) {
    match err {
        EtlError::Connection(_) => error!(error = %err, "could not establish a database session"),
        EtlError::DataFormat { .. } => error!(error = %err, "input file rejected"),
        EtlError::FieldAccess { .. } => error!(error = %err, "input record incomplete"),
        EtlError::Constraint(_) => error!(error = %err, "a batch violated a schema constraint"),
        EtlError::Query(_) => error!(error = %err, "a database statement failed"),
        EtlError::Config(_) => error!(error = %err, "invalid configuration"),
        EtlError::Io(_) => error!(error = %err, "file system failure"),
    }
}

/// Console display of the report bundle. Kept in the binary: the report
/// engine hands back rows only.
fn display_report(report: &PipelineReport, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let separator = "-".repeat(50);

    println!(
        "Loaded {} students and {} rooms.",
        report.students_loaded, report.rooms_loaded
    );
    println!("{separator}");

    println!("Rooms by student count:");
    for row in &report.reports.occupancy {
        println!("  - Room '{}': {} students", row.room, row.students);
    }
    println!("{separator}");

    println!("Top 5 rooms with the smallest average student age:");
    for row in &report.reports.youngest {
        println!(
            "  - Room '{}': Average age {:.2} years",
            row.room, row.average_age
        );
    }
    println!("{separator}");

    println!("Top 5 rooms with the largest age difference among students:");
    for row in &report.reports.age_spread {
        println!(
            "  - Room '{}': Age difference of {} years",
            row.room, row.age_spread
        );
    }
    println!("{separator}");

    println!("Rooms housing students of different sexes:");
    for row in &report.reports.mixed {
        println!("  - Room '{}'", row.room);
    }
    println!("{separator}");

    Ok(())
}
