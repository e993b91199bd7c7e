//! Content-addressed cache for generated artifacts
//!
//! Artifacts are stored as JSON under a string key. [`SampleStore::get_or_compute`]
//! returns the stored artifact on a hit and only runs the computation on a
//! miss, so a hit skips detection, fitting, scaling and sampling entirely.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Cache key of a sample package: `{name}-{seed}-{num_samples}.json`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageKey {
    pub name: String,
    pub seed: u64,
    pub num_samples: usize,
}

impl PackageKey {
    #[must_use]
    pub fn new(name: impl Into<String>, seed: u64, num_samples: usize) -> Self {
        Self {
            name: name.into(),
            seed,
            num_samples,
        }
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}-{}-{}.json", self.name, self.seed, self.num_samples)
    }
}

/// Cache key of the detected market set for a run name.
#[must_use]
pub fn markets_key(name: &str) -> String {
    format!("{name}.markets.json")
}

/// Byte store keyed by name.
pub trait SampleStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Publish `bytes` under `key`. Readers never observe a partial write.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Return the artifact stored under `key`, or compute, store and return it.
    fn get_or_compute<T, E, F>(&self, key: &str, compute: F) -> Result<T, E>
    where
        Self: Sized,
        T: Serialize + DeserializeOwned,
        E: From<StoreError>,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(bytes) = self.get(key)? {
            tracing::info!(key, "cache hit");
            return serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Parse(format!("{key}: {e}")).into());
        }

        let value = compute()?;
        let bytes =
            serde_json::to_vec(&value).map_err(|e| StoreError::Serialize(e.to_string()))?;
        self.put(key, &bytes)?;
        tracing::info!(key, bytes = bytes.len(), "cached artifact");
        Ok(value)
    }
}

/// Distinguishes temp files of concurrent writers within one process.
static WRITE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Write bytes to a file atomically using write-then-rename.
///
/// Each call writes its own temp file, so concurrent writers of one path
/// never share a partial file; the last rename wins.
fn atomic_write_bytes(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let n = WRITE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp_path = path.with_extension(format!("{}.{n}.tmp", std::process::id()));
    if let Err(e) = fs::write(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    fs::rename(&temp_path, path)
}

/// Store backed by one file per key in a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl SampleStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        atomic_write_bytes(&self.path(key), bytes)?;
        Ok(())
    }
}

/// In-process store that counts hits and misses.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }
}

impl SampleStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Io("memory store lock poisoned".to_string()))?;
        let found = entries.get(key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(found)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Io("memory store lock poisoned".to_string()))?
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
