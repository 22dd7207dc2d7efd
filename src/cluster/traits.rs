//! Cluster model traits.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::AttributeRecord;

/// Opaque cluster label, e.g. `"Cluster 3"`.
///
/// Only a [`ClusterModel`] produces these; everything else looks them up.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(String);

impl ClusterId {
    /// Wrap a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClusterId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ClusterId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A pretrained model that maps a record to its cluster.
///
/// Implementations must be deterministic: the same record always yields the
/// same id, and that id is always one of [`ClusterModel::cluster_ids`].
pub trait ClusterModel {
    /// Assign `record` to a cluster.
    fn assign(&self, record: &AttributeRecord) -> Result<ClusterId>;

    /// Every id this model can produce, in model order.
    fn cluster_ids(&self) -> Vec<ClusterId>;

    /// Number of clusters.
    fn n_clusters(&self) -> usize {
        self.cluster_ids().len()
    }

    /// Assign a batch of records, failing on the first error.
    ///
    /// Returns one id per input record, in input order.
    fn assign_all(&self, records: &[AttributeRecord]) -> Result<Vec<ClusterId>> {
        records.iter().map(|r| self.assign(r)).collect()
    }
}

impl<M: ClusterModel + ?Sized> ClusterModel for Box<M> {
    fn assign(&self, record: &AttributeRecord) -> Result<ClusterId> {
        (**self).assign(record)
    }

    fn cluster_ids(&self) -> Vec<ClusterId> {
        (**self).cluster_ids()
    }

    fn n_clusters(&self) -> usize {
        (**self).n_clusters()
    }

    fn assign_all(&self, records: &[AttributeRecord]) -> Result<Vec<ClusterId>> {
        (**self).assign_all(records)
    }
}
