//! Flat-file JSON backend.
//!
//! Each collection lives in memory and is mirrored to its own file, holding a
//! single top-level array pretty-printed with 4-space indentation. Every append
//! rewrites the whole file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::record::{ProctoringLog, Student};

use super::RecordStore;

/// Load a collection from `path`.
///
/// A missing, unreadable or malformed file yields an empty collection. The
/// caller never sees an error; the condition is only traced.
#[must_use]
pub fn load_all<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No collection file at {}, starting empty", path.display());
            return Vec::new();
        }
        Err(e) => {
            warn!("Cannot read {}: {}, starting empty", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(items) => items,
        Err(e) => {
            warn!("Invalid JSON in {}: {}, starting empty", path.display(), e);
            Vec::new()
        }
    }
}

/// Serialize `items` as a 4-space indented JSON array.
fn to_pretty_json<T: Serialize>(items: &[T]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    items.serialize(&mut ser)?;
    Ok(buf)
}

/// Overwrite `path` with `bytes` via a sibling temp file and a rename.
fn write_replace(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, bytes)
        .and_then(|()| fs::rename(&tmp, path))
        .map_err(|source| {
            let _ = fs::remove_file(&tmp);
            Error::Persist {
                path: path.to_path_buf(),
                source,
            }
        })
}

/// One append-only collection mirrored to a JSON file.
///
/// The mutex is held across the whole append-and-persist cycle, so concurrent
/// appends are serialized and none is lost.
#[derive(Debug)]
pub struct JsonCollection<T> {
    path: PathBuf,
    items: Mutex<Vec<T>>,
    name: &'static str,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Load the collection from `path`, recovering silently to empty.
    #[must_use]
    pub fn load(name: &'static str, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = load_all(&path);
        debug!("Loaded {} {} from {}", items.len(), name, path.display());
        Self {
            path,
            items: Mutex::new(items),
            name,
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<T>>> {
        self.items.lock().map_err(|_| Error::LockPoisoned(self.name))
    }

    /// Append `item` and rewrite the backing file. Returns the new length.
    ///
    /// If the write fails the in-memory collection is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn append(&self, item: T) -> Result<usize> {
        let mut items = self.lock()?;
        items.push(item);

        let written =
            to_pretty_json(items.as_slice()).and_then(|bytes| write_replace(&self.path, &bytes));
        if let Err(e) = written {
            items.pop();
            return Err(e);
        }

        debug!("Persisted {} {} to {}", items.len(), self.name, self.path.display());
        Ok(items.len())
    }

    /// Snapshot of the collection in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn list(&self) -> Result<Vec<T>> {
        Ok(self.lock()?.clone())
    }

    /// Run `f` over the collection without cloning it.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> Result<R> {
        Ok(f(self.lock()?.as_slice()))
    }
}

/// Record store backed by two independent JSON files.
#[derive(Debug)]
pub struct JsonStore {
    students: JsonCollection<Student>,
    logs: JsonCollection<ProctoringLog>,
}

impl JsonStore {
    /// Load both collections, creating their parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if a parent directory cannot be created.
    pub fn open(students_path: impl Into<PathBuf>, logs_path: impl Into<PathBuf>) -> Result<Self> {
        let students_path = students_path.into();
        let logs_path = logs_path.into();

        for path in [&students_path, &logs_path] {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
            }
        }

        Ok(Self {
            students: JsonCollection::load("students", students_path),
            logs: JsonCollection::load("logs", logs_path),
        })
    }
}

impl RecordStore for JsonStore {
    fn register_student(&self, student: Student) -> Result<usize> {
        self.students.append(student)
    }

    fn students(&self) -> Result<Vec<Student>> {
        self.students.list()
    }

    fn find_student(&self, email: &str) -> Result<Option<Student>> {
        self.students
            .with_items(|students| students.iter().find(|s| s.email == email).cloned())
    }

    fn flag_event(&self, log: ProctoringLog) -> Result<usize> {
        self.logs.append(log)
    }

    fn logs(&self) -> Result<Vec<ProctoringLog>> {
        self.logs.list()
    }

    fn count_events(&self, email: &str) -> Result<usize> {
        self.logs
            .with_items(|logs| logs.iter().filter(|l| l.email == email).count())
    }

    fn location(&self) -> String {
        format!(
            "{}, {}",
            self.students.path().display(),
            self.logs.path().display()
        )
    }
}
