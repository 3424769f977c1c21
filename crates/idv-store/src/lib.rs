//! # idv-store — The Persistent Step Store
//!
//! A durable, flat key→value store that survives process restarts. It
//! holds the serialized current step of each sub-flow plus the ancillary
//! session fields (tokens, retry counters, accepted-terms flags), keyed
//! by the fixed identifiers in [`keys`].
//!
//! ## Contract
//!
//! - `put`/`get` are synchronous and side-effect-free beyond the store.
//! - Values are opaque serialized blobs to the store; their schema is
//!   owned by the orchestrator.
//! - Encode/decode errors are non-fatal: a value that does not decode is
//!   treated as "no stored value" with a warning.
//! - The store tracks every key it has ever recorded in its own
//!   registry; [`StepStore::clear`] removes all of them and additionally
//!   purges the artifact directory (captured media), if one is
//!   configured.
//! - Writes are last-writer-wins with no cross-key transaction. Each
//!   coordinator writes only its own key namespace, so this is
//!   acceptable.
//! - A corrupted backing file at open starts the store empty with a
//!   warning (fail-soft, matching the step codec contract).

pub mod keys;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced by the store.
///
/// Only opening can fail hard; runtime encode/decode problems degrade to
/// "no stored value" per the store contract.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("store io error at {path}: {source}")]
    Io {
        /// The backing file path.
        path: PathBuf,
        /// Underlying io error.
        source: std::io::Error,
    },
}

/// On-disk layout of the backing file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    entries: BTreeMap<String, serde_json::Value>,
    registry: BTreeSet<String>,
}

/// Durable key/value store for flow state.
///
/// Cheap to share behind a reference; all mutation is serialized through
/// an internal lock. In-memory stores (for tests and ephemeral sessions)
/// skip the backing file entirely.
#[derive(Debug)]
pub struct StepStore {
    state: Mutex<Persisted>,
    path: Option<PathBuf>,
    artifact_dir: Option<PathBuf>,
}

impl StepStore {
    /// Open a store backed by `path`, creating it on first use.
    ///
    /// A backing file that exists but does not parse starts the store
    /// empty with a warning: persisted state is recoverable garbage,
    /// never a startup failure.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Persisted>(&bytes) {
                Ok(state) => state,
                Err(err) => {
                    warn!(path = %path.display(), %err, "store file corrupted; starting empty");
                    Persisted::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Persisted::default(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self {
            state: Mutex::new(state),
            path: Some(path),
            artifact_dir: None,
        })
    }

    /// Create a store with no backing file.
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(Persisted::default()),
            path: None,
            artifact_dir: None,
        }
    }

    /// Configure the directory of temporary capture artifacts that
    /// [`StepStore::clear`] purges alongside the keys.
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// Store a value under `key`, registering the key.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) {
        let encoded = match serde_json::to_value(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(key, %err, "value encoding failed; nothing stored");
                return;
            }
        };
        {
            let mut state = self.lock();
            state.entries.insert(key.to_string(), encoded);
            state.registry.insert(key.to_string());
        }
        self.flush();
    }

    /// Fetch and decode the value under `key`.
    ///
    /// Returns `None` for absent keys and for values that fail to
    /// decode (with a warning); decode errors are non-fatal.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.lock().entries.get(key).cloned()?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(key, %err, "stored value did not decode; treating as absent");
                None
            }
        }
    }

    /// Remove the value under `key`. The key stays in the registry.
    pub fn remove(&self, key: &str) {
        self.lock().entries.remove(key);
        self.flush();
    }

    /// Whether a value is currently stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Remove every key the store has ever recorded and purge the
    /// artifact directory.
    pub fn clear(&self) {
        {
            let mut state = self.lock();
            let registered: Vec<String> = state.registry.iter().cloned().collect();
            for key in registered {
                state.entries.remove(&key);
            }
            state.registry.clear();
        }
        self.flush();
        if let Some(dir) = &self.artifact_dir {
            match std::fs::remove_dir_all(dir) {
                Ok(()) => debug!(dir = %dir.display(), "purged capture artifacts"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => warn!(dir = %dir.display(), %err, "artifact purge failed"),
            }
        }
    }

    /// Keys currently registered (present or previously present).
    pub fn registered_keys(&self) -> Vec<String> {
        self.lock().registry.iter().cloned().collect()
    }

    /// A copy of every stored entry, for inspection tooling.
    pub fn snapshot(&self) -> BTreeMap<String, serde_json::Value> {
        self.lock().entries.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Persisted> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Write the current state to the backing file, if any. Write
    /// failures degrade to a warning: the in-memory view stays
    /// authoritative for the rest of the process lifetime.
    fn flush(&self) {
        let Some(path) = &self.path else { return };
        let state = self.lock();
        let bytes = match serde_json::to_vec_pretty(&*state) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %path.display(), %err, "store serialization failed");
                return;
            }
        };
        drop(state);
        if let Err(err) = write_atomically(path, &bytes) {
            warn!(path = %path.display(), %err, "store flush failed");
        }
    }
}

/// Write via a sibling temp file + rename so a crash mid-write never
/// truncates the store.
fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_round_trip() {
        let store = StepStore::in_memory();
        store.put(keys::RETRY_COUNT, &5u32);
        assert_eq!(store.get::<u32>(keys::RETRY_COUNT), Some(5));
    }

    #[test]
    fn get_with_wrong_type_is_absent() {
        let store = StepStore::in_memory();
        store.put(keys::SESSION_TOKEN, &"T1");
        assert_eq!(store.get::<u32>(keys::SESSION_TOKEN), None);
    }

    #[test]
    fn clear_removes_previously_removed_keys_too() {
        let store = StepStore::in_memory();
        store.put(keys::TERMS_ACCEPTED, &true);
        store.put(keys::PHONE_VERIFIED, &true);
        store.remove(keys::TERMS_ACCEPTED);
        store.clear();
        assert!(store.registered_keys().is_empty());
        assert!(!store.contains(keys::PHONE_VERIFIED));
    }

    #[test]
    fn reopen_restores_entries_and_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.json");
        {
            let store = StepStore::open(&path).unwrap();
            store.put(keys::SESSION_TOKEN, &"T1");
            store.put(keys::RETRY_COUNT, &4u32);
        }
        let store = StepStore::open(&path).unwrap();
        assert_eq!(store.get::<String>(keys::SESSION_TOKEN).as_deref(), Some("T1"));
        assert_eq!(store.get::<u32>(keys::RETRY_COUNT), Some(4));
        assert_eq!(store.registered_keys().len(), 2);
    }

    #[test]
    fn corrupted_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.json");
        std::fs::write(&path, b"{definitely not json").unwrap();
        let store = StepStore::open(&path).unwrap();
        assert!(store.registered_keys().is_empty());
    }

    #[test]
    fn clear_purges_artifact_dir() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = dir.path().join("captures");
        std::fs::create_dir_all(&artifacts).unwrap();
        std::fs::write(artifacts.join("selfie.bin"), b"jpeg-ish").unwrap();

        let store = StepStore::in_memory().with_artifact_dir(&artifacts);
        store.clear();
        assert!(!artifacts.exists());
    }

    #[test]
    fn clear_with_missing_artifact_dir_is_quiet() {
        let store = StepStore::in_memory().with_artifact_dir("/nonexistent/captures");
        store.clear();
    }
}
