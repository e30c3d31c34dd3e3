//! Saved-document storage.
//!
//! A `DocumentStore` keeps named diagram documents keyed by file id. The
//! listing is always newest first. `LocalStore` writes one JSON file per
//! document into a data directory; `MemoryStore` keeps everything in process
//! and can be told to fail, which is how callers' failure handling is tested.

use crate::document::{DiagramDocument, write_atomic};
use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, warn};

/// Metadata shown in a file list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub id: String,
    pub name: String,
    /// Milliseconds since the Unix epoch
    pub last_modified: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedFile {
    pub id: String,
    pub info: FileInfo,
    pub data: DiagramDocument,
}

impl SavedFile {
    pub fn new(info: FileInfo, data: DiagramDocument) -> Self {
        Self {
            id: info.id.clone(),
            info,
            data,
        }
    }
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub trait DocumentStore: Send + Sync {
    /// Insert or replace the file with `file.id`.
    fn save_file(&self, file: &SavedFile) -> StoreResult<()>;

    /// All saved files, most recently modified first.
    fn get_all_files(&self) -> StoreResult<Vec<SavedFile>>;

    fn delete_file(&self, id: &str) -> StoreResult<()>;

    /// Listing that never fails; errors are logged and yield an empty list.
    fn list_or_empty(&self) -> Vec<SavedFile> {
        match self.get_all_files() {
            Ok(files) => files,
            Err(e) => {
                error!(error = %e, "Failed to list saved files");
                Vec::new()
            }
        }
    }
}

fn sort_newest_first(files: &mut [SavedFile]) {
    files.sort_by(|a, b| b.info.last_modified.cmp(&a.info.last_modified));
}

// ============================================================================
// LocalStore
// ============================================================================

/// Directory of `<id>.json` files.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Store under the platform data directory.
    pub fn in_data_dir(data_dir: Option<PathBuf>) -> StoreResult<Self> {
        let dir = data_dir.ok_or(StoreError::NoDataDir)?;
        Self::new(dir.join("diagrams"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for `id`. ASCII letters, digits and `-` are kept; every other
    /// byte is written as `_` plus two hex digits, so distinct ids never
    /// share a file.
    fn path_for(&self, id: &str) -> PathBuf {
        let mut name = String::with_capacity(id.len() + 5);
        for byte in id.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("_{byte:02X}"));
            }
        }
        name.push_str(".json");
        self.dir.join(name)
    }
}

impl DocumentStore for LocalStore {
    fn save_file(&self, file: &SavedFile) -> StoreResult<()> {
        let path = self.path_for(&file.id);
        let json = serde_json::to_vec_pretty(file)?;
        write_atomic(&path, &json).map_err(|source| StoreError::Persist {
            path: path.clone(),
            source,
        })?;
        debug!(id = %file.id, path = %path.display(), "Saved file");
        Ok(())
    }

    fn get_all_files(&self) -> StoreResult<Vec<SavedFile>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(StoreError::from)
                .and_then(|s| serde_json::from_str::<SavedFile>(&s).map_err(StoreError::from));
            match parsed {
                Ok(file) => files.push(file),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable saved file"),
            }
        }
        sort_newest_first(&mut files);
        Ok(files)
    }

    fn delete_file(&self, id: &str) -> StoreResult<()> {
        let path = self.path_for(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

#[derive(Default)]
struct MemoryInner {
    files: HashMap<String, SavedFile>,
    failure: Option<String>,
}

/// In-process store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `StoreError::Unavailable(reason)`; `None`
    /// restores normal operation.
    pub fn set_failure(&self, reason: Option<&str>) {
        self.inner.lock().failure = reason.map(str::to_string);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(inner: &MemoryInner) -> StoreResult<()> {
        match &inner.failure {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn save_file(&self, file: &SavedFile) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        Self::check(&inner)?;
        inner.files.insert(file.id.clone(), file.clone());
        Ok(())
    }

    fn get_all_files(&self) -> StoreResult<Vec<SavedFile>> {
        let inner = self.inner.lock();
        Self::check(&inner)?;
        let mut files: Vec<_> = inner.files.values().cloned().collect();
        sort_newest_first(&mut files);
        Ok(files)
    }

    fn delete_file(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        Self::check(&inner)?;
        inner
            .files
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
