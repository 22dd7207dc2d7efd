//! Cluster catalog: human-readable name and description per cluster.
//!
//! Loaded once from a JSON object keyed by cluster id:
//!
//! ```json
//! { "Cluster 0": { "name": "Górscy miłośnicy kotów", "description": "..." } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cluster::ClusterId;
use crate::error::{Error, Result};

/// Display metadata for one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMetadata {
    /// Short group name.
    pub name: String,
    /// Longer description of the group.
    pub description: String,
}

/// Immutable `ClusterId -> ClusterMetadata` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterCatalog {
    entries: BTreeMap<ClusterId, ClusterMetadata>,
}

impl ClusterCatalog {
    /// Create a catalog from entries.
    pub fn new(entries: impl IntoIterator<Item = (ClusterId, ClusterMetadata)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Parse a catalog from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::data(format!("malformed cluster catalog: {e}")))
    }

    /// Read and parse a catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::data(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Metadata for `id`.
    ///
    /// A missing entry means the model and catalog are out of sync; it is
    /// reported as [`Error::UnknownCluster`], never defaulted.
    pub fn describe(&self, id: &ClusterId) -> Result<&ClusterMetadata> {
        self.entries
            .get(id)
            .ok_or_else(|| Error::UnknownCluster { id: id.clone() })
    }

    /// Whether `id` has an entry.
    pub fn contains(&self, id: &ClusterId) -> bool {
        self.entries.contains_key(id)
    }

    /// All ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &ClusterId> {
        self.entries.keys()
    }

    /// All entries, sorted by id.
    pub fn iter(&self) -> impl Iterator<Item = (&ClusterId, &ClusterMetadata)> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
