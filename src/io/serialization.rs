// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Guide data serialization and deserialization.
//!
//! The storage blob is written as JSON or YAML, and the config file is
//! read as YAML, chosen by file extension.

use anyhow::{bail, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

/// On-disk format of a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Pick the format from the path's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|s| s.to_str());
        match extension {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            _ => bail!("Unsupported file extension: {:?}", extension),
        }
    }
}

/// Serialize `data` into text in the given format.
pub fn to_string<T: Serialize>(data: &T, format: Format) -> Result<String> {
    Ok(match format {
        Format::Json => serde_json::to_string(data)?,
        Format::Yaml => serde_yaml::to_string(data)?,
    })
}

/// Parse text in the given format.
pub fn from_str<T: DeserializeOwned>(text: &str, format: Format) -> Result<T> {
    Ok(match format {
        Format::Json => serde_json::from_str(text)?,
        Format::Yaml => serde_yaml::from_str(text)?,
    })
}

/// Read data from `path`, in the format its extension names.
pub fn import<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = Format::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    from_str(&text, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::Project;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a.json")).unwrap(), Format::Json);
        assert_eq!(Format::from_path(Path::new("a.yml")).unwrap(), Format::Yaml);
        assert!(Format::from_path(Path::new("a.txt")).is_err());
    }

    #[test]
    fn test_project_survives_yaml_and_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::new("Onboarding", "First day");

        for name in ["project.json", "project.yaml"] {
            let path = dir.path().join(name);
            let text = to_string(&project, Format::from_path(&path).unwrap()).unwrap();
            std::fs::write(&path, text).unwrap();
            let back: Project = import(&path).unwrap();
            assert_eq!(back, project);
        }
    }
}
