// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Read once at startup from `<config dir>/stepguide/config.yaml`. A missing
//! file means defaults; every field may be left out.

use crate::io::{serialization, storage::STORAGE_NAME};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "stepguide";
const CONFIG_NAME: &str = "config.yaml";

/// Overrides the storage file location.
pub const STORAGE_ENV: &str = "STEPGUIDE_STORAGE";

/// Raster and encoding parameters of the PDF export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Screenshots wider than this are flattened at this width.
    pub reference_width: u32,
    /// Pixel multiplier applied on top of the reference width.
    pub raster_scale: f32,
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            reference_width: 800,
            raster_scale: 2.0,
            jpeg_quality: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where projects are saved. Defaults to the platform data directory.
    pub storage_file: Option<PathBuf>,
    pub export: ExportConfig,
}

impl AppConfig {
    /// Load the user's config file, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        if let Ok(path) = std::env::var(STORAGE_ENV) {
            if !path.is_empty() {
                config.storage_file = Some(PathBuf::from(path));
            }
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config = serialization::import(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Storage file to open: the configured one, else the default location.
    pub fn storage_path(&self) -> PathBuf {
        self.storage_file.clone().unwrap_or_else(default_storage_path)
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_NAME))
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(STORAGE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "export:\n  jpeg_quality: 95\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.export.jpeg_quality, 95);
        assert_eq!(config.export.reference_width, 800);
        assert_eq!(config.export.raster_scale, 2.0);
        assert!(config.storage_file.is_none());
    }

    #[test]
    fn test_storage_path_prefers_configured_file() {
        let config = AppConfig {
            storage_file: Some(PathBuf::from("/tmp/guides.yaml")),
            ..Default::default()
        };
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/guides.yaml"));

        let default = AppConfig::default().storage_path();
        assert!(default.ends_with(Path::new(APP_DIR).join(STORAGE_NAME)));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "export: [1, 2").unwrap();
        assert!(AppConfig::from_file(&path).is_err());
    }
}
