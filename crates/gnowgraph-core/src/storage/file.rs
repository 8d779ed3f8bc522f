use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::StorageConfig;
use crate::graph::GraphSnapshot;

use super::error::StorageError;
use super::Storage;

/// Serialization format of a snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
}

impl SnapshotFormat {
    /// `.yaml` and `.yml` select YAML, everything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                SnapshotFormat::Yaml
            }
            _ => SnapshotFormat::Json,
        }
    }
}

impl std::fmt::Display for SnapshotFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotFormat::Json => f.write_str("JSON"),
            SnapshotFormat::Yaml => f.write_str("YAML"),
        }
    }
}

/// File-based storage implementation.
///
/// Keeps the whole graph in one snapshot file:
/// ```text
/// .gnow/
///   graph.json      # or graph.yaml
/// ```
/// Writes go to a sibling temp file that is then renamed over the
/// snapshot, so a crash never leaves a half-written file behind.
pub struct FileStorage {
    path: PathBuf,
    format: SnapshotFormat,
}

impl FileStorage {
    /// Creates a new FileStorage with default config.
    pub fn new() -> Self {
        Self::with_config(StorageConfig::default())
    }

    /// Creates a new FileStorage with custom configuration.
    pub fn with_config(config: StorageConfig) -> Self {
        Self::at(config.graph_path())
    }

    /// Creates a FileStorage for an explicit snapshot path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = SnapshotFormat::from_path(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SnapshotFormat {
        self.format
    }

    fn temp_path(&self) -> Result<PathBuf, StorageError> {
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidPath(self.path.clone()))?;
        Ok(self.path.with_file_name(format!(".{}.tmp", name)))
    }

    /// Ensures the snapshot's directory exists.
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
            }
        }
        Ok(())
    }
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<Option<GraphSnapshot>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path).map_err(|e| StorageError::io(&self.path, e))?;
        let snapshot = match self.format {
            SnapshotFormat::Json => serde_json::from_str(&text)
                .map_err(|e| StorageError::corrupt(&self.path, self.format, e))?,
            SnapshotFormat::Yaml => serde_yaml::from_str(&text)
                .map_err(|e| StorageError::corrupt(&self.path, self.format, e))?,
        };
        debug!(path = %self.path.display(), "loaded snapshot");
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &GraphSnapshot) -> Result<(), StorageError> {
        self.ensure_dir()?;
        let text = match self.format {
            SnapshotFormat::Json => serde_json::to_string_pretty(snapshot)
                .map_err(|e| StorageError::encode(self.format, e))?,
            SnapshotFormat::Yaml => serde_yaml::to_string(snapshot)
                .map_err(|e| StorageError::encode(self.format, e))?,
        };

        let temp = self.temp_path()?;
        fs::write(&temp, text).map_err(|e| StorageError::io(&temp, e))?;
        fs::rename(&temp, &self.path).map_err(|e| StorageError::io(&self.path, e))?;
        debug!(path = %self.path.display(), nodes = snapshot.nodes.len(), "saved snapshot");
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}
