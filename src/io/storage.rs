// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Durable storage backends for the guide store.
//!
//! The whole state is one named blob that is rewritten after every
//! mutation and read once at startup.

use super::serialization::{self, Format};
use crate::error::{GuideError, Result};
use crate::store::PersistedState;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// File name of the storage blob inside the data directory.
pub const STORAGE_NAME: &str = "guide-builder-storage.json";

/// Where the store's state lives between runs.
pub trait StorageBackend: Send {
    /// Read the saved state, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<PersistedState>>;

    /// Replace the saved state.
    fn save(&mut self, state: &PersistedState) -> Result<()>;
}

/// State kept in a JSON (or YAML) file.
pub struct FileStorage {
    path: PathBuf,
    format: Format,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = Format::from_path(&path).map_err(|e| GuideError::Storage(e.to_string()))?;
        Ok(Self { path, format })
    }
}

impl StorageBackend for FileStorage {
    fn load(&self) -> Result<Option<PersistedState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path).map_err(|e| GuideError::Storage(e.to_string()))?;
        serialization::from_str(&text, self.format)
            .map(Some)
            .map_err(|e| GuideError::Storage(format!("{}: {}", self.path.display(), e)))
    }

    fn save(&mut self, state: &PersistedState) -> Result<()> {
        let text = serialization::to_string(state, self.format).map_err(|e| GuideError::Storage(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GuideError::Storage(e.to_string()))?;
        }

        // Write beside the target and rename, so a crash never leaves half a file.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, text).map_err(|e| GuideError::Storage(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| GuideError::Storage(e.to_string()))?;
        Ok(())
    }
}

/// In-memory blob, shared between clones so tests can inspect what was saved.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved blob, as JSON text.
    pub fn snapshot(&self) -> Option<String> {
        self.blob.lock().ok().and_then(|b| b.clone())
    }
}

impl StorageBackend for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedState>> {
        match self.snapshot() {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| GuideError::Storage(e.to_string())),
            None => Ok(None),
        }
    }

    fn save(&mut self, state: &PersistedState) -> Result<()> {
        let text = serde_json::to_string(state).map_err(|e| GuideError::Storage(e.to_string()))?;
        let mut blob = self
            .blob
            .lock()
            .map_err(|_| GuideError::Storage("storage lock poisoned".to_string()))?;
        *blob = Some(text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::Project;

    fn state_with(name: &str) -> PersistedState {
        let project = Project::new(name, "");
        PersistedState {
            current_project_id: Some(project.id),
            projects: vec![project],
        }
    }

    #[test]
    fn test_missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join(STORAGE_NAME)).unwrap();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_file_round_trip_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.yaml");
        let mut storage = FileStorage::new(&path).unwrap();
        let state = state_with("Release checklist");

        storage.save(&state).unwrap();
        assert!(path.exists());
        assert_eq!(storage.load().unwrap(), Some(state));
    }

    #[test]
    fn test_json_blob_is_written_compact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORAGE_NAME);
        let mut storage = FileStorage::new(&path).unwrap();
        storage.save(&state_with("Compact")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains('\n'));
        assert!(text.starts_with("{\"projects\":["));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert!(matches!(FileStorage::new("state.bin"), Err(GuideError::Storage(_))));
    }

    #[test]
    fn test_corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORAGE_NAME);
        std::fs::write(&path, "{not json").unwrap();
        let storage = FileStorage::new(&path).unwrap();
        assert!(matches!(storage.load(), Err(GuideError::Storage(_))));
    }

    #[test]
    fn test_memory_storage_shares_blob_between_clones() {
        let storage = MemoryStorage::new();
        let mut writer = storage.clone();
        writer.save(&state_with("Shared")).unwrap();

        let text = storage.snapshot().unwrap();
        assert!(text.contains("currentProjectId"));
        assert_eq!(storage.load().unwrap().unwrap().projects[0].name, "Shared");
    }
}
