//! `SQLite` backend.
//!
//! Both collections live in one database. Insertion order is the
//! autoincrement `id`, which keeps "first registered student wins" identical to
//! the JSON backend.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{ProctoringLog, Student};

use super::schema;
use super::{RecordStore, StoreStats};

/// Record store backed by a single `SQLite` database.
#[derive(Debug)]
pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or its schema is
    /// unusable.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL;")?;
        schema::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        schema::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned("database"))
    }

    fn count(conn: &Connection, table: &str) -> Result<usize> {
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn row_to_student(row: &rusqlite::Row) -> rusqlite::Result<Student> {
        Ok(Student {
            name: row.get(0)?,
            email: row.get(1)?,
            role: row.get(2)?,
        })
    }

    fn row_to_log(row: &rusqlite::Row) -> rusqlite::Result<ProctoringLog> {
        Ok(ProctoringLog {
            email: row.get(0)?,
            event: row.get(1)?,
        })
    }
}

impl RecordStore for SqliteStore {
    fn register_student(&self, student: Student) -> Result<usize> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO students (name, email, role) VALUES (?1, ?2, ?3)",
            params![student.name, student.email, student.role],
        )?;
        debug!("Inserted student with id {}", conn.last_insert_rowid());
        Self::count(&conn, "students")
    }

    fn students(&self) -> Result<Vec<Student>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name, email, role FROM students ORDER BY id ASC")?;
        let students = stmt
            .query_map([], Self::row_to_student)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(students)
    }

    fn find_student(&self, email: &str) -> Result<Option<Student>> {
        let conn = self.conn()?;
        let student = conn
            .query_row(
                "SELECT name, email, role FROM students WHERE email = ?1 ORDER BY id ASC LIMIT 1",
                [email],
                Self::row_to_student,
            )
            .optional()?;
        Ok(student)
    }

    fn flag_event(&self, log: ProctoringLog) -> Result<usize> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO proctoring_logs (email, event) VALUES (?1, ?2)",
            params![log.email, log.event],
        )?;
        Self::count(&conn, "proctoring_logs")
    }

    fn logs(&self) -> Result<Vec<ProctoringLog>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT email, event FROM proctoring_logs ORDER BY id ASC")?;
        let logs = stmt
            .query_map([], Self::row_to_log)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    fn count_events(&self, email: &str) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM proctoring_logs WHERE email = ?1",
            [email],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn()?;
        Ok(StoreStats {
            total_students: Self::count(&conn, "students")?,
            total_events: Self::count(&conn, "proctoring_logs")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("failed to create test store")
    }

    #[test]
    fn test_open_in_memory() {
        let store = create_test_store();
        assert_eq!(store.path().to_string_lossy(), ":memory:");
        assert_eq!(
            store.stats().unwrap(),
            StoreStats {
                total_students: 0,
                total_events: 0
            }
        );
    }

    #[test]
    fn test_register_and_find() {
        let store = create_test_store();
        assert_eq!(
            store.register_student(Student::new("Ada", "ada@example.com", "student")).unwrap(),
            1
        );

        let found = store.find_student("ada@example.com").unwrap().unwrap();
        assert_eq!(found, Student::new("Ada", "ada@example.com", "student"));
        assert!(store.find_student("bob@example.com").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_first_wins() {
        let store = create_test_store();
        store
            .register_student(Student::new("First", "dup@example.com", "student"))
            .unwrap();
        store
            .register_student(Student::new("Second", "dup@example.com", "faculty"))
            .unwrap();

        assert_eq!(store.students().unwrap().len(), 2);
        assert_eq!(store.find_student("dup@example.com").unwrap().unwrap().name, "First");
    }

    #[test]
    fn test_logs_keep_order() {
        let store = create_test_store();
        for event in ["look_away", "phone", "tab_switch"] {
            store.flag_event(ProctoringLog::new("a@example.com", event)).unwrap();
        }

        let events: Vec<String> = store.logs().unwrap().into_iter().map(|l| l.event).collect();
        assert_eq!(events, vec!["look_away", "phone", "tab_switch"]);
    }

    #[test]
    fn test_count_events() {
        let store = create_test_store();
        store.flag_event(ProctoringLog::new("a@example.com", "x")).unwrap();
        store.flag_event(ProctoringLog::new("a@example.com", "y")).unwrap();
        store.flag_event(ProctoringLog::new("b@example.com", "x")).unwrap();

        assert_eq!(store.count_events("a@example.com").unwrap(), 2);
        assert_eq!(store.count_events("nobody").unwrap(), 0);
    }

    #[test]
    fn test_reopen_file_based() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("proctorlog.db");

        let store = SqliteStore::open(&db_path).unwrap();
        store
            .register_student(Student::new("Ada", "ada@example.com", "student"))
            .unwrap();
        store.flag_event(ProctoringLog::new("ada@example.com", "look_away")).unwrap();
        let students = store.students().unwrap();
        let logs = store.logs().unwrap();
        drop(store);

        let reopened = SqliteStore::open(&db_path).unwrap();
        assert_eq!(reopened.students().unwrap(), students);
        assert_eq!(reopened.logs().unwrap(), logs);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/proctorlog.db");

        let _store = SqliteStore::open(&nested).unwrap();
        assert!(nested.exists());
    }
}
