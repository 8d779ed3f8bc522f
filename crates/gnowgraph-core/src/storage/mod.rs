mod error;
mod file;

pub use error::StorageError;
pub use file::{FileStorage, SnapshotFormat};

use crate::graph::GraphSnapshot;

/// Trait for graph snapshot backends.
///
/// Implementations persist the whole graph as one snapshot and hand it
/// back on load.
pub trait Storage {
    /// Loads the stored snapshot, or `None` when nothing has been saved.
    fn load(&self) -> Result<Option<GraphSnapshot>, StorageError>;

    /// Replaces the stored snapshot.
    fn save(&self, snapshot: &GraphSnapshot) -> Result<(), StorageError>;

    /// Whether a snapshot has been saved.
    fn exists(&self) -> bool;
}
