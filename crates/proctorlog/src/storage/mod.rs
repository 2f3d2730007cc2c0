//! Storage layer for proctorlog.
//!
//! Students and proctoring logs are two append-only collections. Handlers only
//! see the [`RecordStore`] trait; the backend behind it is picked from
//! configuration:
//!
//! - [`JsonStore`]: one pretty-printed JSON array file per collection,
//!   rewritten wholesale on every append.
//! - [`SqliteStore`]: both collections as tables of one `SQLite` database.

pub mod json;
pub mod schema;
pub mod sqlite;

use std::sync::Arc;

use tracing::info;

use crate::config::{Config, StorageBackend};
use crate::error::Result;
use crate::record::{ProctoringLog, RiskScore, Student};

pub use json::{load_all, JsonCollection, JsonStore};
pub use sqlite::SqliteStore;

/// Persistence interface shared by all backends.
///
/// Collections are append-only: there is no update or delete. Every append is
/// durable before it returns.
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Append a student and persist. Returns the total number of students.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be persisted.
    fn register_student(&self, student: Student) -> Result<usize>;

    /// All students in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn students(&self) -> Result<Vec<Student>>;

    /// First student registered with exactly this email.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn find_student(&self, email: &str) -> Result<Option<Student>>;

    /// Append a proctoring log and persist. Returns the total number of logs.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be persisted.
    fn flag_event(&self, log: ProctoringLog) -> Result<usize>;

    /// All proctoring logs in submission order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn logs(&self) -> Result<Vec<ProctoringLog>>;

    /// Number of logs recorded against exactly this email.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn count_events(&self, email: &str) -> Result<usize>;

    /// Human-readable location of the backing data, for status output.
    fn location(&self) -> String;

    /// Collection sizes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            total_students: self.students()?.len(),
            total_events: self.logs()?.len(),
        })
    }

    /// Risk assessment for an email. Unknown emails score zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn risk_score(&self, email: &str) -> Result<RiskScore> {
        Ok(RiskScore::new(email, self.count_events(email)?))
    }
}

/// Sizes of the two collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    /// Number of registered students (duplicates included).
    pub total_students: usize,
    /// Number of flagged events.
    pub total_events: usize,
}

/// Open the store selected by `config`.
///
/// # Errors
///
/// Returns an error if the data directory or database cannot be created.
pub fn open(config: &Config) -> Result<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match config.storage.backend {
        StorageBackend::Json => Arc::new(JsonStore::open(
            config.students_path(),
            config.logs_path(),
        )?),
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(config.database_path())?),
    };
    info!(
        "Record store ready ({} backend) at {}",
        config.storage.backend,
        store.location()
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config_in(dir: &std::path::Path, backend: StorageBackend) -> Config {
        let mut config = Config::default();
        config.storage.backend = backend;
        config.storage.data_dir = Some(PathBuf::from(dir));
        config
    }

    fn exercise(store: &dyn RecordStore) {
        assert_eq!(
            store.register_student(Student::new("Ada", "ada@example.com", "student")).unwrap(),
            1
        );
        store.flag_event(ProctoringLog::new("ada@example.com", "look_away")).unwrap();
        store.flag_event(ProctoringLog::new("ada@example.com", "tab_switch")).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_students, 1);
        assert_eq!(stats.total_events, 2);

        let score = store.risk_score("ada@example.com").unwrap();
        assert_eq!(score.risk_score, 2);
        assert_eq!(score.risk_level, crate::record::RiskLevel::Medium);
    }

    #[test]
    fn test_open_json_backend() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&config_in(dir.path(), StorageBackend::Json)).unwrap();
        exercise(store.as_ref());
        assert!(dir.path().join("students.json").exists());
        assert!(dir.path().join("proctoring_logs.json").exists());
    }

    #[test]
    fn test_open_sqlite_backend() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&config_in(dir.path(), StorageBackend::Sqlite)).unwrap();
        exercise(store.as_ref());
        assert!(dir.path().join("proctorlog.db").exists());
    }

    #[test]
    fn test_risk_score_unknown_email() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&config_in(dir.path(), StorageBackend::Json)).unwrap();

        let score = store.risk_score("nobody@example.com").unwrap();
        assert_eq!(score.risk_score, 0);
        assert_eq!(score.risk_level, crate::record::RiskLevel::Low);
    }
}
