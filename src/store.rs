//! # Local Store
//! Synchronous key/value persistence shim, the stand-in for per-browser storage.
//!
//! Values are plain strings (integers as decimal text, lists as JSON arrays)
//! kept under fixed keys. A file-backed store rewrites its whole JSON file on
//! every `set_item`; at board scale that is fine and keeps the file readable.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::error::{BackendError, BackendResult};

pub const KEY_VISITOR_COUNT: &str = "visitorCount";
pub const KEY_NOTICES: &str = "notices";
pub const KEY_GUEST_POSTS: &str = "guestPosts";
pub const KEY_GITHUB_TOKEN: &str = "github_token";

#[derive(Debug)]
pub struct LocalStore {
    inner: Mutex<BTreeMap<String, String>>,
    path: Option<PathBuf>,
    changes: broadcast::Sender<String>,
}

impl LocalStore {
    /// Open (or lazily create) a file-backed store. A missing file is an empty
    /// store; an unreadable or malformed one is an error.
    pub fn open(path: impl Into<PathBuf>) -> BackendResult<Self> {
        let path = path.into();
        let map = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| {
                BackendError::storage(format!("reading {}: {e}", path.display()))
            })?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| {
                    BackendError::storage(format!("parsing {}: {e}", path.display()))
                })?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self::with_map(map, Some(path)))
    }

    /// Volatile store, used by tests and when no data path is writable.
    pub fn in_memory() -> Self {
        Self::with_map(BTreeMap::new(), None)
    }

    fn with_map(map: BTreeMap<String, String>, path: Option<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            inner: Mutex::new(map),
            path,
            changes,
        }
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        let map = self.inner.lock().expect("local store mutex poisoned");
        map.get(key).cloned()
    }

    /// Persist first, then publish. A failed flush leaves the store as it was.
    pub fn set_item(&self, key: &str, value: impl Into<String>) -> BackendResult<()> {
        {
            let mut map = self.inner.lock().expect("local store mutex poisoned");
            let mut next = map.clone();
            next.insert(key.to_string(), value.into());
            self.flush(&next)?;
            *map = next;
        }
        let _ = self.changes.send(key.to_string());
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> BackendResult<()> {
        {
            let mut map = self.inner.lock().expect("local store mutex poisoned");
            if !map.contains_key(key) {
                return Ok(());
            }
            let mut next = map.clone();
            next.remove(key);
            self.flush(&next)?;
            *map = next;
        }
        let _ = self.changes.send(key.to_string());
        Ok(())
    }

    /// Keys written from now on, in write order.
    pub fn watch(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }

    fn flush(&self, map: &BTreeMap<String, String>) -> BackendResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                BackendError::storage(format!("creating {}: {e}", dir.display()))
            })?;
        }
        let body = serde_json::to_string_pretty(map)?;
        // Write to a sibling temp file first so a crash never leaves half a file.
        let tmp = path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp)
            .map_err(|e| BackendError::storage(format!("writing {}: {e}", tmp.display())))?;
        f.write_all(body.as_bytes())
            .and_then(|_| f.sync_all())
            .map_err(|e| BackendError::storage(format!("writing {}: {e}", tmp.display())))?;
        fs::rename(&tmp, path)
            .map_err(|e| BackendError::storage(format!("replacing {}: {e}", path.display())))?;
        Ok(())
    }
}
