//! Nearest-centroid assignment.
//!
//! The inference half of k-means: centroids are fixed by an offline training
//! run, and a new record goes to whichever centroid is closest in one-hot
//! space:
//!
//! ```text
//! assign(x) = argminₖ ||enc(x) - μₖ||²
//! ```
//!
//! Ties go to the centroid listed first in the artifact, so assignment is a
//! pure function of the record and the artifact.
//!
//! # Artifact format
//!
//! ```json
//! {
//!   "clusters": [
//!     { "id": "Cluster 0",
//!       "weights": { "gender": { "Kobieta": 0.9, "Mężczyzna": 0.1 } } }
//!   ]
//! }
//! ```
//!
//! Each weight is the centroid coordinate for the `attribute=value` column;
//! columns not listed are 0.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::encode::OneHotEncoder;
use super::traits::{ClusterId, ClusterModel};
use crate::error::{Error, Result};
use crate::schema::{Attribute, AttributeRecord, Schema};

/// Serialized form of a trained centroid model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Centroids, in tie-breaking order.
    pub clusters: Vec<CentroidSpec>,
}

/// One centroid in a [`ModelArtifact`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidSpec {
    /// Cluster label.
    pub id: ClusterId,
    /// `attribute -> value -> coordinate`.
    #[serde(default)]
    pub weights: BTreeMap<String, BTreeMap<String, f32>>,
}

/// Pretrained nearest-centroid cluster model.
#[derive(Debug, Clone)]
pub struct CentroidModel {
    ids: Vec<ClusterId>,
    /// One row per cluster, `encoder.width()` columns.
    centroids: Array2<f32>,
    encoder: OneHotEncoder,
    strict: bool,
}

impl CentroidModel {
    /// Create a model from raw centroid vectors laid out by `schema`'s encoder.
    ///
    /// Strict validation is on by default.
    pub fn new(schema: Schema, ids: Vec<ClusterId>, centroids: Vec<Vec<f32>>) -> Result<Self> {
        if ids.is_empty() {
            return Err(Error::model("model has no clusters"));
        }
        if ids.len() != centroids.len() {
            return Err(Error::model(format!(
                "{} cluster ids but {} centroids",
                ids.len(),
                centroids.len()
            )));
        }

        let mut seen = HashSet::new();
        for id in &ids {
            if !seen.insert(id) {
                return Err(Error::model(format!("duplicate cluster id '{id}'")));
            }
        }

        let encoder = OneHotEncoder::new(schema);
        let n = ids.len();
        let d = encoder.width();

        let mut flat: Vec<f32> = Vec::with_capacity(n * d);
        for point in &centroids {
            if point.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: point.len(),
                });
            }
            if point.iter().any(|x| !x.is_finite()) {
                return Err(Error::model("centroid contains a non-finite coordinate"));
            }
            flat.extend(point);
        }
        let centroids =
            Array2::from_shape_vec((n, d), flat).map_err(|e| Error::model(e.to_string()))?;

        Ok(Self {
            ids,
            centroids,
            encoder,
            strict: true,
        })
    }

    /// Build from a parsed artifact.
    pub fn from_artifact(schema: Schema, artifact: &ModelArtifact) -> Result<Self> {
        let encoder = OneHotEncoder::new(schema);
        let mut ids = Vec::with_capacity(artifact.clusters.len());
        let mut centroids = Vec::with_capacity(artifact.clusters.len());

        for entry in &artifact.clusters {
            let mut row = vec![0.0f32; encoder.width()];
            for (attr_name, values) in &entry.weights {
                let attribute: Attribute = attr_name.parse().map_err(|e: String| {
                    Error::model(format!("cluster '{}': {e}", entry.id))
                })?;
                for (value, &weight) in values {
                    let col = encoder.column(attribute, value).ok_or_else(|| {
                        Error::model(format!(
                            "cluster '{}': '{value}' is not a value of '{attribute}'",
                            entry.id
                        ))
                    })?;
                    row[col] = weight;
                }
            }
            ids.push(entry.id.clone());
            centroids.push(row);
        }

        Self::new(encoder.schema().clone(), ids, centroids)
    }

    /// Parse an artifact from JSON text.
    pub fn from_json_str(schema: Schema, json: &str) -> Result<Self> {
        let artifact: ModelArtifact = serde_json::from_str(json)
            .map_err(|e| Error::model(format!("malformed model artifact: {e}")))?;
        Self::from_artifact(schema, &artifact)
    }

    /// Read and parse an artifact file.
    pub fn from_path(schema: Schema, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::model(format!("{}: {e}", path.display())))?;
        Self::from_json_str(schema, &json)
    }

    /// Enable or disable strict schema validation of assigned records.
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether out-of-domain values are rejected.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// The encoder used to place records in centroid space.
    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    /// Centroid of `id`, if the model has it.
    pub fn centroid(&self, id: &ClusterId) -> Option<ArrayView1<'_, f32>> {
        self.ids
            .iter()
            .position(|i| i == id)
            .map(|k| self.centroids.row(k))
    }

    /// Compute squared Euclidean distance.
    fn squared_distance(a: &ArrayView1<'_, f32>, b: &ArrayView1<'_, f32>) -> f32 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
    }

    /// Row index of the centroid closest to `point`; first wins on ties.
    fn nearest(&self, point: &ArrayView1<'_, f32>) -> usize {
        let mut best_cluster = 0;
        let mut best_dist = f32::MAX;

        for k in 0..self.ids.len() {
            let dist = Self::squared_distance(point, &self.centroids.row(k));
            if dist < best_dist {
                best_dist = dist;
                best_cluster = k;
            }
        }
        best_cluster
    }
}

impl ClusterModel for CentroidModel {
    fn assign(&self, record: &AttributeRecord) -> Result<ClusterId> {
        let point = self.encoder.encode(record, self.strict)?;
        let k = self.nearest(&point.view());
        Ok(self.ids[k].clone())
    }

    fn cluster_ids(&self) -> Vec<ClusterId> {
        self.ids.clone()
    }

    fn n_clusters(&self) -> usize {
        self.ids.len()
    }

    #[cfg(feature = "parallel")]
    fn assign_all(&self, records: &[AttributeRecord]) -> Result<Vec<ClusterId>> {
        records.par_iter().map(|r| self.assign(r)).collect()
    }
}
