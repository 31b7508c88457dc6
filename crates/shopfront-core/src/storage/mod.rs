//! Durable client storage for session credentials.
//!
//! The session manager only relies on two string entries, addressed through
//! [`StorageKeys`]. Everything else about the storage backend is private to
//! the implementation.
//!
//! ## Backends
//!
//! | Backend | Persistence |
//! |---------|-------------|
//! | [`FileTokenStorage`] | JSON document on disk, survives restarts |
//! | [`MemoryTokenStorage`] | Process memory only |

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Names of the entries the session persists.
///
/// Key names are part of the on-disk format; a new set of names means a new
/// version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageKeys {
    /// Format version these names belong to
    pub version: u32,
    /// Entry holding the access token
    pub access: &'static str,
    /// Entry holding the refresh token
    pub refresh: &'static str,
}

impl StorageKeys {
    /// First and current key layout.
    pub const V1: Self = Self {
        version: 1,
        access: "access_token",
        refresh: "refresh_token",
    };
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::V1
    }
}

/// Durable key/value storage for credentials.
pub trait TokenStorage: Send + Sync {
    /// Read an entry.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write an entry, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete an entry. Removing a missing entry is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// On-disk representation of the session file.
#[derive(Debug, Serialize, Deserialize)]
struct SessionDocument {
    version: u32,
    entries: BTreeMap<String, String>,
}

impl Default for SessionDocument {
    fn default() -> Self {
        Self {
            version: StorageKeys::V1.version,
            entries: BTreeMap::new(),
        }
    }
}

/// Token storage backed by a JSON file.
///
/// Every operation reads the file fresh, so two processes sharing the file
/// see each other's logins.
#[derive(Debug)]
pub struct FileTokenStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStorage {
    /// Create storage at the given path. The file is created lazily.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the path of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<SessionDocument> {
        if !self.path.exists() {
            return Ok(SessionDocument::default());
        }

        let file = fs::File::open(&self.path).map_err(|e| {
            Error::Storage(format!(
                "Failed to open session file at {}: {}",
                self.path.display(),
                e
            ))
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            Error::Storage(format!(
                "Failed to parse session file at {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Write the document next to the session file, then move it into place.
    ///
    /// A failed write leaves the previous file untouched.
    fn write_document(&self, doc: &SessionDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!(
                    "Failed to create session directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_vec_pretty(doc).map_err(|e| {
            Error::Storage(format!("Failed to serialize session document: {e}"))
        })?;

        let temp_path = self.path.with_extension("tmp");
        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(&json)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|()| fs::rename(&temp_path, &self.path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::Storage(format!(
                "Failed to write session file at {}: {}",
                self.path.display(),
                e
            )));
        }

        tracing::debug!(path = %self.path.display(), "Saved session file");
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut doc, discarded) = match self.read_document() {
            Ok(doc) => (doc, false),
            Err(e) => {
                tracing::warn!("Discarding unreadable session file: {e}");
                (SessionDocument::default(), true)
            }
        };
        if f(&mut doc.entries) || discarded {
            self.write_document(&doc)?;
        }
        Ok(())
    }
}

impl TokenStorage for FileTokenStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_document()?.entries.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

/// Token storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryTokenStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the given entry is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
