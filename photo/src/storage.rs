use crate::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Byte store the pipeline reads inputs from and writes results to.
pub trait ImageStorage: Send + Sync {
    fn load(&self, key: &str) -> Result<Vec<u8>>;
    fn store(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Process-local buffers keyed by name.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImageStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Vec<u8>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("memory storage lock poisoned".into()))?;
        entries
            .get(key)
            .cloned()
            .ok_or_else(|| Error::Storage(format!("no entry named '{key}'")))
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Storage("memory storage lock poisoned".into()))?;
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Files under a root directory; keys are plain file names.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\'])
            && !key.contains('\0');
        if !valid {
            return Err(Error::InvalidInput(format!("invalid storage key '{key}'")));
        }
        Ok(self.root.join(key))
    }
}

impl ImageStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        fs::read(&path).map_err(|e| Error::Storage(format!("{}: {e}", path.display())))
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(|e| Error::Storage(format!("{}: {e}", self.root.display())))?;
        fs::write(&path, bytes).map_err(|e| Error::Storage(format!("{}: {e}", path.display())))
    }
}
