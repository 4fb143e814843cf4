#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Database connection, incident query engine, and migrations for safer.
//!
//! Uses `switchy_database` raw parameterized queries against a single
//! `incidents` relation (plus `job_requests` for the hire-an-agent flow and
//! `comm_sub` for alert subscriptions) and `switchy_schema` for embedded SQL
//! migrations.
//!
//! Every read view shares one filter predicate built by
//! [`filters::Predicate`]. Views that issue several statements observe the
//! database independently per statement, so a concurrent write between
//! them can make a dashboard snapshot briefly inconsistent.

pub mod db;
pub mod digest;
pub mod filters;
pub mod jobs;
pub mod queries;
pub mod subscriptions;

use chrono::{DateTime, NaiveDateTime};
use include_dir::{Dir, include_dir};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::Database;
use switchy_schema::discovery::embedded::EmbeddedMigrationSource;
use switchy_schema::runner::MigrationRunner;

/// Embedded SQL migrations from the `migrations/` directory.
static MIGRATIONS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/../../migrations");

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] switchy_schema::MigrationError),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Runs all pending database migrations.
///
/// # Errors
///
/// Returns [`DbError`] if any migration fails to apply.
pub async fn run_migrations(db: &dyn Database) -> Result<(), DbError> {
    let source = EmbeddedMigrationSource::new(&MIGRATIONS_DIR);
    let runner = MigrationRunner::new(Box::new(source));
    runner.run(db).await?;
    log::info!("Database migrations completed successfully");
    Ok(())
}

/// Converts a non-negative `COUNT`/`SUM` result to `u64`, clamping
/// negatives to zero.
pub(crate) fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Decodes a timestamp column.
///
/// Backends that return native timestamps decode directly. Otherwise the
/// column is read as text in any of the layouts a driver may produce:
/// - `2025-01-15 10:30:00`
/// - `2025-01-15T10:30:00.123`
/// - `2025-01-15 10:30:00+00:00`
pub(crate) fn row_timestamp(row: &switchy_database::Row, column: &str) -> Option<NaiveDateTime> {
    if let Ok(value) = row.to_value::<Option<NaiveDateTime>>(column) {
        return value;
    }
    let raw: String = row.to_value::<Option<String>>(column).ok().flatten()?;
    let parsed = parse_timestamp(&raw);
    if parsed.is_none() {
        log::warn!("Failed to parse {column} timestamp: {raw:?}");
    }
    parsed
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

/// Decodes a boolean column stored either natively or as `0`/`1`.
pub(crate) fn row_flag(row: &switchy_database::Row, column: &str) -> bool {
    row.to_value::<bool>(column)
        .or_else(|_| row.to_value::<i64>(column).map(|v| v != 0))
        .unwrap_or(false)
}

/// In-memory `SQLite` schema mirroring the migrations, for tests.
///
/// Timestamp columns are `TEXT`. Rows are seeded through bound
/// parameters, so stored and compared timestamps share one layout.
#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, NaiveDateTime};
    use switchy_database::{Database, DatabaseValue};

    pub async fn memory_db() -> Box<dyn Database> {
        let db = switchy_database_connection::init_sqlite_rusqlite(None).unwrap();
        db.exec_raw(
            "CREATE TABLE incidents (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT,
                type        TEXT,
                category    TEXT,
                state       TEXT,
                lga         TEXT,
                latitude    REAL,
                longitude   REAL,
                status      TEXT NOT NULL DEFAULT 'pending',
                start_time  TEXT,
                end_time    TEXT,
                closed_at   TEXT,
                victims     INTEGER NOT NULL DEFAULT 0,
                casualties  INTEGER NOT NULL DEFAULT 0,
                injured     INTEGER,
                missing     INTEGER,
                description TEXT,
                created_at  TEXT
            )",
        )
        .await
        .unwrap();
        db.exec_raw(
            "CREATE TABLE job_requests (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                full_name        TEXT NOT NULL,
                phone            TEXT NOT NULL,
                email            TEXT,
                agent_type       TEXT NOT NULL,
                job_type         TEXT NOT NULL,
                state            TEXT NOT NULL,
                lga              TEXT NOT NULL,
                address          TEXT NOT NULL,
                job_details      TEXT,
                number_of_agents INTEGER NOT NULL DEFAULT 1,
                number_of_days   INTEGER NOT NULL DEFAULT 1,
                inter_city       BOOLEAN NOT NULL DEFAULT 0,
                foreign_national BOOLEAN NOT NULL DEFAULT 0,
                status           TEXT NOT NULL DEFAULT 'pending',
                created_at       TEXT
            )",
        )
        .await
        .unwrap();
        db.exec_raw(
            "CREATE TABLE comm_sub (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                whatsapp_number TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL,
                created_at      TEXT
            )",
        )
        .await
        .unwrap();
        db
    }

    pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    /// One incident row. Unset fields default to an open Lagos incident on
    /// 2025-01-01 with no victims.
    #[derive(Clone)]
    pub struct Seed {
        pub incident_type: &'static str,
        pub state: &'static str,
        pub lga: &'static str,
        pub status: &'static str,
        pub victims: i32,
        pub casualties: i32,
        pub injured: Option<i32>,
        pub description: &'static str,
        pub start_time: NaiveDateTime,
    }

    impl Default for Seed {
        fn default() -> Self {
            Self {
                incident_type: "Robbery",
                state: "Lagos",
                lga: "Ikeja",
                status: "open",
                victims: 0,
                casualties: 0,
                injured: None,
                description: "",
                start_time: at(2025, 1, 1, 8),
            }
        }
    }

    pub async fn seed(db: &dyn Database, seed: &Seed) {
        db.exec_raw_params(
            "INSERT INTO incidents (type, state, lga, status, start_time, victims, casualties, injured, description)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            &[
                DatabaseValue::String(seed.incident_type.to_string()),
                DatabaseValue::String(seed.state.to_string()),
                DatabaseValue::String(seed.lga.to_string()),
                DatabaseValue::String(seed.status.to_string()),
                DatabaseValue::DateTime(seed.start_time),
                DatabaseValue::Int32(seed.victims),
                DatabaseValue::Int32(seed.casualties),
                seed.injured.map_or(DatabaseValue::Null, DatabaseValue::Int32),
                DatabaseValue::String(seed.description.to_string()),
            ],
        )
        .await
        .unwrap();
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        db: &dyn Database,
        incident_type: &'static str,
        state: &'static str,
        lga: &'static str,
        status: &'static str,
        victims: i32,
        casualties: i32,
        description: &'static str,
    ) {
        seed(
            db,
            &Seed {
                incident_type,
                state,
                lga,
                status,
                victims,
                casualties,
                description,
                ..Seed::default()
            },
        )
        .await;
    }
}
