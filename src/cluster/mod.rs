//! Cluster models: mapping a respondent onto a pretrained cluster.
//!
//! The engine treats the model as an opaque classifier behind the
//! [`ClusterModel`] trait. Training happens elsewhere; this crate only loads
//! the result and runs inference.
//!
//! ## Nearest-centroid inference
//!
//! The shipped implementation, [`CentroidModel`], is the assignment step of
//! k-means applied to one-hot encoded records:
//!
//! ```text
//! record ──► OneHotEncoder ──► x ∈ {0,1}ᵈ ──► argminₖ ||x - μₖ||² ──► ClusterId
//! ```
//!
//! Categorical answers carry no natural distance, so each attribute is
//! expanded into one column per permitted value. A centroid coordinate is
//! then the share of that cluster's training members giving that answer.
//!
//! ## Usage
//!
//! ```rust
//! use cohort::cluster::{CentroidModel, ClusterModel};
//! use cohort::{AttributeRecord, Schema};
//!
//! let json = r#"{"clusters": [
//!     {"id": "Cluster 0", "weights": {"gender": {"Kobieta": 1.0}}},
//!     {"id": "Cluster 1", "weights": {"gender": {"Mężczyzna": 1.0}}}
//! ]}"#;
//! let model = CentroidModel::from_json_str(Schema::survey(), json).unwrap();
//!
//! let r = AttributeRecord::new("25-34", "Wyższe", "Koty i Psy", "W górach", "Kobieta");
//! assert_eq!(model.assign(&r).unwrap().as_str(), "Cluster 0");
//! ```

mod centroid;
mod encode;
mod traits;

pub use centroid::{CentroidModel, CentroidSpec, ModelArtifact};
pub use encode::OneHotEncoder;
pub use traits::{ClusterId, ClusterModel};
