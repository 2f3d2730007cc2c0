//! `SQLite` schema for the database backend.
//!
//! Tables are created idempotently on open. The `metadata` table records the
//! schema version; a database written by a newer build is refused rather than
//! silently misread.

use rusqlite::Connection;

use crate::error::{Error, Result};

/// The schema version this build writes.
pub const CURRENT_VERSION: i32 = 1;

/// Key under which the schema version is stored in `metadata`.
const VERSION_KEY: &str = "schema_version";

/// Students, in registration order by `id`.
pub const CREATE_STUDENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    role TEXT NOT NULL
)
";

/// Flagged events, in submission order by `id`.
pub const CREATE_LOGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS proctoring_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL,
    event TEXT NOT NULL
)
";

/// Login and start-exam lookups.
pub const CREATE_STUDENTS_EMAIL_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_students_email ON students(email, id)
";

/// Risk score counts.
pub const CREATE_LOGS_EMAIL_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_proctoring_logs_email ON proctoring_logs(email)
";

/// Key-value metadata.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_STUDENTS_TABLE,
    CREATE_LOGS_TABLE,
    CREATE_STUDENTS_EMAIL_INDEX,
    CREATE_LOGS_EMAIL_INDEX,
    CREATE_METADATA_TABLE,
];

/// Create the schema if needed and stamp or check its version.
///
/// # Errors
///
/// Returns an error if a statement fails or the database carries a newer
/// schema version than [`CURRENT_VERSION`].
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    match schema_version(conn)? {
        0 => set_schema_version(conn, CURRENT_VERSION),
        v if v > CURRENT_VERSION => Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {v} is newer than supported version {CURRENT_VERSION}"
            ),
        }),
        _ => Ok(()),
    }
}

/// Stored schema version, or 0 for a fresh database.
fn schema_version(conn: &Connection) -> Result<i32> {
    let result: std::result::Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    );

    match result {
        Ok(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}
