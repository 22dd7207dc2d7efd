//! # cohort
//!
//! Peer-group matching for survey respondents: assign a respondent to the
//! nearest cluster of a pretrained model, then summarize the reference
//! population members that share that cluster.
//!
//! ```text
//! AttributeRecord ──► ClusterModel ──► ClusterId ──┬─► ClusterCatalog      ──► ClusterMetadata
//!                                                  └─► ReferencePopulation ──► GroupAggregate
//! ```
//!
//! The entry point is [`MatchContext::match_respondent`]. Artifacts are loaded
//! once per context and shared read-only afterwards.
//!
//! ```rust,no_run
//! use cohort::{AttributeRecord, EngineConfig, MatchContext};
//!
//! let context = MatchContext::from_config(EngineConfig::default())?;
//! context.preload()?;
//!
//! let me = AttributeRecord::new("25-34", "Wyższe", "Koty i Psy", "W górach", "Kobieta");
//! let matched = context.match_respondent(&me)?;
//! println!("{}: {} members", matched.metadata.name, matched.aggregate.member_count());
//! # Ok::<(), cohort::Error>(())
//! ```

pub mod aggregate;
pub mod catalog;
pub mod cluster;
pub mod config;
pub mod engine;
/// Error types used across `cohort`.
pub mod error;
pub mod population;
pub mod schema;
pub mod validate;

#[cfg(test)]
mod engine_tests;

pub use aggregate::{aggregate, GroupAggregate};
pub use catalog::{ClusterCatalog, ClusterMetadata};
pub use cluster::{CentroidModel, ClusterId, ClusterModel};
pub use config::EngineConfig;
pub use engine::{ArtifactSource, FileSource, GroupMatch, MatchContext, SharedModel};
pub use error::{Error, Result};
pub use population::{LabeledRecord, ReferencePopulation};
pub use schema::{Attribute, AttributeRecord, Schema, UNKNOWN};
pub use validate::{Severity, ValidationIssue, ValidationReport};
