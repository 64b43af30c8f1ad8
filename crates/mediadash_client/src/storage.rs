use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use client_logging::{client_debug, client_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage location missing or not writable: {0}")]
    Location(String),
    #[error("failed to encode stored values: {0}")]
    Encode(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// String key/value persistence, the client's equivalent of browser local storage.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Applies every change as one atomic update: `Some` sets a key, `None` removes it.
    /// Readers observe either none or all of the changes.
    fn apply(&self, changes: &[(&str, Option<&str>)]) -> Result<(), StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.apply(&[(key, Some(value))])
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.apply(&[(key, None)])
    }
}

type Entries = BTreeMap<String, String>;

fn apply_changes(entries: &mut Entries, changes: &[(&str, Option<&str>)]) {
    for (key, value) in changes {
        match value {
            Some(value) => {
                entries.insert((*key).to_string(), (*value).to_string());
            }
            None => {
                entries.remove(*key);
            }
        }
    }
}

fn lock(entries: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<Entries>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn apply(&self, changes: &[(&str, Option<&str>)]) -> Result<(), StorageError> {
        apply_changes(&mut lock(&self.entries), changes);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedEntries {
    entries: Entries,
}

/// RON file holding all keys. The file is rewritten atomically on every change,
/// and the in-memory copy is only updated once the write succeeded.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl FileStorage {
    /// Opens the store at `path`. A missing file is an empty store; an unreadable
    /// or corrupt file is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn apply(&self, changes: &[(&str, Option<&str>)]) -> Result<(), StorageError> {
        let mut guard = lock(&self.entries);
        let mut next = guard.clone();
        apply_changes(&mut next, changes);

        let persisted = PersistedEntries { entries: next };
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(&persisted, pretty)
            .map_err(|err| StorageError::Encode(err.to_string()))?;
        write_atomically(&self.path, &content)?;

        *guard = persisted.entries;
        client_debug!("Persisted {} key(s) to {:?}", guard.len(), self.path);
        Ok(())
    }
}

fn load_entries(path: &Path) -> Entries {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Entries::new(),
        Err(err) => {
            client_warn!("Failed to read stored session from {:?}: {}", path, err);
            return Entries::new();
        }
    };

    match ron::from_str::<PersistedEntries>(&content) {
        Ok(state) => state.entries,
        Err(err) => {
            client_warn!("Failed to parse stored session from {:?}: {}", path, err);
            Entries::new()
        }
    }
}

/// Write `content` to a temp file next to `target`, then rename it into place.
fn write_atomically(target: &Path, content: &str) -> Result<(), StorageError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if dir.exists() {
        let meta = fs::metadata(&dir).map_err(|e| StorageError::Location(e.to_string()))?;
        if !meta.is_dir() {
            return Err(StorageError::Location(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(&dir).map_err(|e| StorageError::Location(e.to_string()))?;
    }

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(target).map_err(|e| StorageError::Io(e.error))?;
    Ok(())
}
