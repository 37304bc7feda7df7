//! A small string key/value store mirrored to a JSON file.
//!
//! This plays the role a browser's `localStorage` plays for a web client:
//! the conversation and the theme preference are kept here between runs.

use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Storage key holding the JSON-encoded message list.
pub const MESSAGES_KEY: &str = "chatMessages";
/// Storage key holding `"light"` or `"dark"`.
pub const THEME_KEY: &str = "theme";

#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    Corrupt { path: PathBuf, reason: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "storage I/O error: {e}"),
            StorageError::Corrupt { path, reason } => {
                write!(f, "storage file {} is unreadable: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Corrupt { .. } => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(value: io::Error) -> Self {
        StorageError::Io(value)
    }
}

#[derive(Debug, Default)]
pub struct LocalStorage {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl LocalStorage {
    /// Open the store at the platform data directory.
    pub fn open_default() -> Result<Self, StorageError> {
        match Self::default_path() {
            Some(path) => Self::open_or_recover(path),
            None => {
                tracing::warn!("no data directory available; storage will not persist");
                Ok(Self::in_memory())
            }
        }
    }

    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store. A file that is not a JSON object of
    /// strings is reported as [`StorageError::Corrupt`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened local storage");
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    /// Like [`Self::open`], but an unreadable store is moved aside to
    /// `<name>.bak` and replaced by an empty one at the same path.
    pub fn open_or_recover(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        match Self::open(&path) {
            Err(StorageError::Corrupt { reason, .. }) => {
                let backup = backup_path(&path);
                tracing::warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    "storage file is unreadable ({reason}); starting with an empty store"
                );
                fs::rename(&path, &backup)?;
                Ok(Self {
                    path: Some(path),
                    entries: BTreeMap::new(),
                })
            }
            other => other,
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "parlance", "parlance")
            .map(|dirs| dirs.data_dir().join("storage.json"))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.into());
        self.flush()
    }

    pub fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let contents = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| StorageError::Io(io::Error::other(e)))?;

        // Write to a sibling temp file and rename so a crash never leaves a
        // half-written store behind.
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty_store() {
        let temp_dir = TempDir::new().expect("temp dir");
        let storage = LocalStorage::open(temp_dir.path().join("storage.json")).expect("open");
        assert_eq!(storage.get_item(MESSAGES_KEY), None);
    }

    #[test]
    fn set_item_persists_across_reopen() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("nested").join("storage.json");

        let mut storage = LocalStorage::open(&path).expect("open");
        storage.set_item(THEME_KEY, "dark").expect("set");

        let reopened = LocalStorage::open(&path).expect("reopen");
        assert_eq!(reopened.get_item(THEME_KEY), Some("dark"));
    }

    #[test]
    fn remove_item_deletes_key() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("storage.json");

        let mut storage = LocalStorage::open(&path).expect("open");
        storage.set_item(MESSAGES_KEY, "[]").expect("set");
        storage.set_item(THEME_KEY, "light").expect("set");
        storage.remove_item(MESSAGES_KEY).expect("remove");

        let reopened = LocalStorage::open(&path).expect("reopen");
        assert_eq!(reopened.get_item(MESSAGES_KEY), None);
        assert_eq!(reopened.get_item(THEME_KEY), Some("light"));
    }

    #[test]
    fn removing_absent_key_is_ok() {
        let mut storage = LocalStorage::in_memory();
        storage.remove_item("nothing").expect("remove");
    }

    #[test]
    fn corrupt_file_is_reported() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, "not json").expect("write");

        match LocalStorage::open(&path) {
            Err(StorageError::Corrupt { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected corrupt error, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_file_is_moved_aside_on_recover() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, r#"{"theme":"#).expect("write");

        let mut storage = LocalStorage::open_or_recover(&path).expect("recover");
        assert_eq!(storage.get_item(THEME_KEY), None);
        assert_eq!(storage.path(), Some(path.as_path()));

        let backup = temp_dir.path().join("storage.json.bak");
        assert_eq!(fs::read_to_string(&backup).expect("backup"), r#"{"theme":"#);

        storage.set_item(THEME_KEY, "dark").expect("set");
        let reopened = LocalStorage::open(&path).expect("reopen");
        assert_eq!(reopened.get_item(THEME_KEY), Some("dark"));
    }

    #[test]
    fn recover_leaves_healthy_files_alone() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, r#"{"theme":"light"}"#).expect("write");

        let storage = LocalStorage::open_or_recover(&path).expect("open");
        assert_eq!(storage.get_item(THEME_KEY), Some("light"));
        assert!(!temp_dir.path().join("storage.json.bak").exists());
    }

    #[test]
    fn in_memory_store_keeps_values() {
        let mut storage = LocalStorage::in_memory();
        storage.set_item(THEME_KEY, "dark").expect("set");
        assert_eq!(storage.get_item(THEME_KEY), Some("dark"));
        assert!(storage.path().is_none());
    }
}
