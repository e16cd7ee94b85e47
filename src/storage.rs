//! Small persisted key/value state.
//!
//! Two values outlive a single session: the legal tool's last file
//! reference, so risk analysis can run in a later invocation, and the
//! orthodontic analytics session id. They are kept in one JSON object in
//! `state.json` inside the configured state directory, rewritten atomically
//! on every change. A change that cannot be written is not applied in memory
//! either. Without a directory the store lives in memory only.

use crate::error::InsightsError;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Key of the legal tool's persisted file reference.
pub const FILE_REFERENCE_KEY: &str = "fileReference";

/// Key of the orthodontic analytics session id.
pub const SESSION_ID_KEY: &str = "ortho_session_id";

const STATE_FILE: &str = "state.json";

/// JSON key/value store backed by a file or by memory.
#[derive(Debug)]
pub struct StateStore {
    path: Option<PathBuf>,
    values: Mutex<Map<String, Value>>,
}

impl StateStore {
    /// Open (or create) the store in `dir`.
    ///
    /// An unreadable or corrupt state file is logged and treated as empty.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, InsightsError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| InsightsError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = dir.join(STATE_FILE);

        let values = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Ignoring corrupt state file {}: {}", path.display(), e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!("Cannot read state file {}: {}", path.display(), e);
                Map::new()
            }
        };

        debug!("State store at {} ({} keys)", path.display(), values.len());
        Ok(Self {
            path: Some(path),
            values: Mutex::new(values),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Mutex::new(Map::new()),
        }
    }

    fn values(&self) -> std::sync::MutexGuard<'_, Map<String, Value>> {
        self.values.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), InsightsError> {
        let mut values = self.values();
        let mut next = values.clone();
        next.insert(key.to_string(), Value::String(value.to_string()));
        self.flush(&next)?;
        *values = next;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), InsightsError> {
        let mut values = self.values();
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.flush(&next)?;
        *values = next;
        Ok(())
    }

    /// The analytics session id, created on first use.
    pub fn session_id(&self) -> Result<String, InsightsError> {
        if let Some(id) = self.get(SESSION_ID_KEY) {
            return Ok(id);
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.set(SESSION_ID_KEY, &id)?;
        Ok(id)
    }

    fn flush(&self, values: &Map<String, Value>) -> Result<(), InsightsError> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        let write_err = |e: std::io::Error| InsightsError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        };
        let json = serde_json::to_vec_pretty(values)
            .map_err(|e| InsightsError::Internal(format!("serialise state: {e}")))?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&json).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = StateStore::open(dir.path()).unwrap();
            store.set(FILE_REFERENCE_KEY, "tmp/abc").unwrap();
        }
        let store = StateStore::open(dir.path()).unwrap();
        assert_eq!(store.get(FILE_REFERENCE_KEY).as_deref(), Some("tmp/abc"));

        store.remove(FILE_REFERENCE_KEY).unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        assert_eq!(store.get(FILE_REFERENCE_KEY), None);
    }

    #[test]
    fn failed_write_leaves_values_unchanged() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("state");
        let store = StateStore::open(&dir).unwrap();
        store.set(FILE_REFERENCE_KEY, "tmp/kept").unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert!(store.set(SESSION_ID_KEY, "s-1").is_err());
        assert_eq!(store.get(SESSION_ID_KEY), None);
        assert!(store.remove(FILE_REFERENCE_KEY).is_err());
        assert_eq!(store.get(FILE_REFERENCE_KEY).as_deref(), Some("tmp/kept"));
    }

    #[test]
    fn session_id_is_stable() {
        let store = StateStore::in_memory();
        let a = store.session_id().unwrap();
        let b = store.session_id().unwrap();
        assert_eq!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STATE_FILE), b"{not json").unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        assert_eq!(store.get(FILE_REFERENCE_KEY), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }
}
