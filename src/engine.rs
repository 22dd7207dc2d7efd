//! Matching orchestrator.
//!
//! [`MatchContext`] owns the three loaded artifacts and hands out
//! [`GroupMatch`] results:
//!
//! ```text
//! respondent ──► model.assign ──► id ──┬─► catalog.describe(id)      ──┐
//!                                      └─► population.members_of(id) ──┴─► aggregate ──► GroupMatch
//! ```
//!
//! Each artifact is loaded lazily, at most once per context, behind a
//! [`OnceCell`]. Concurrent first callers block on the same initialization;
//! a failed load is not cached and is retried by the next call. After
//! [`MatchContext::preload`] succeeds every call is pure computation over
//! shared, read-only state.

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, GroupAggregate};
use crate::catalog::{ClusterCatalog, ClusterMetadata};
use crate::cluster::{CentroidModel, ClusterId, ClusterModel};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::population::{read_records_from_path, ReferencePopulation};
use crate::schema::{AttributeRecord, Schema};
use crate::validate::{check_consistency, Severity, ValidationReport};

/// A model usable from any thread.
pub type SharedModel = Box<dyn ClusterModel + Send + Sync>;

/// Where a [`MatchContext`] obtains its artifacts.
///
/// Implementations own the on-disk (or in-memory) encodings; the engine only
/// sees parsed values.
pub trait ArtifactSource {
    /// Load the cluster model. Failures should be [`Error::ModelUnavailable`].
    fn load_model(&self, schema: &Schema) -> Result<SharedModel>;

    /// Load the cluster catalog. Failures should be [`Error::DataUnavailable`].
    fn load_catalog(&self) -> Result<ClusterCatalog>;

    /// Load the unlabeled reference population. Failures should be
    /// [`Error::DataUnavailable`].
    fn load_raw_population(&self) -> Result<Vec<AttributeRecord>>;
}

/// Reads artifacts from the paths in an [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    config: EngineConfig,
}

impl FileSource {
    /// Create a source for `config`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The backing config.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl ArtifactSource for FileSource {
    fn load_model(&self, schema: &Schema) -> Result<SharedModel> {
        let model = CentroidModel::from_path(schema.clone(), &self.config.model_path)?
            .with_strict_validation(self.config.strict_validation);
        Ok(Box::new(model))
    }

    fn load_catalog(&self) -> Result<ClusterCatalog> {
        ClusterCatalog::from_path(&self.config.catalog_path)
    }

    fn load_raw_population(&self) -> Result<Vec<AttributeRecord>> {
        read_records_from_path(&self.config.population_path, self.config.delimiter)
    }
}

/// Result of matching one respondent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMatch {
    /// Cluster the respondent was assigned to.
    pub cluster_id: ClusterId,
    /// Catalog metadata of that cluster.
    pub metadata: ClusterMetadata,
    /// Summary of the cluster's reference members.
    pub aggregate: GroupAggregate,
}

impl GroupMatch {
    /// Split into `(metadata, aggregate)`.
    pub fn into_parts(self) -> (ClusterMetadata, GroupAggregate) {
        (self.metadata, self.aggregate)
    }
}

/// Explicit engine context: schema, artifact source, and once-only caches.
pub struct MatchContext<S = FileSource> {
    source: S,
    schema: Schema,
    model: OnceCell<SharedModel>,
    catalog: OnceCell<ClusterCatalog>,
    population: OnceCell<ReferencePopulation>,
}

impl MatchContext<FileSource> {
    /// Create a file-backed context from `config` using the survey schema.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        Ok(Self::new(FileSource::new(config)?))
    }
}

impl<S: ArtifactSource> MatchContext<S> {
    /// Create a context over `source` using the survey schema.
    pub fn new(source: S) -> Self {
        Self::with_schema(source, Schema::survey())
    }

    /// Create a context over `source` with a custom schema.
    pub fn with_schema(source: S, schema: Schema) -> Self {
        Self {
            source,
            schema,
            model: OnceCell::new(),
            catalog: OnceCell::new(),
            population: OnceCell::new(),
        }
    }

    /// The schema records are checked against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The artifact source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The cluster model, loading it on first use.
    pub fn model(&self) -> Result<&(dyn ClusterModel + Send + Sync)> {
        let model = self.model.get_or_try_init(|| {
            let model = self.source.load_model(&self.schema).map_err(|e| match e {
                Error::ModelUnavailable { .. } => e,
                other => Error::model(other.to_string()),
            })?;
            if model.n_clusters() == 0 {
                return Err(Error::model("model has no clusters"));
            }
            info!(clusters = model.n_clusters(), "cluster model loaded");
            Ok(model)
        })?;
        Ok(&**model)
    }

    /// The cluster catalog, loading it on first use.
    pub fn catalog(&self) -> Result<&ClusterCatalog> {
        self.catalog.get_or_try_init(|| {
            let catalog = self.source.load_catalog()?;
            info!(entries = catalog.len(), "cluster catalog loaded");
            Ok(catalog)
        })
    }

    /// The labeled reference population, loading it (and the model) on
    /// first use.
    pub fn population(&self) -> Result<&ReferencePopulation> {
        self.population.get_or_try_init(|| {
            let model = self.model()?;
            let raw = self.source.load_raw_population()?;
            let population = ReferencePopulation::label(raw, model)?;
            info!(
                records = population.len(),
                clusters = population.cluster_sizes().len(),
                "reference population labeled"
            );
            Ok(population)
        })
    }

    /// Load every artifact now instead of on the first match.
    pub fn preload(&self) -> Result<()> {
        self.model()?;
        self.catalog()?;
        self.population()?;
        Ok(())
    }

    /// Assign `respondent` to a cluster and summarize its reference members.
    ///
    /// Errors from any step are returned unchanged.
    pub fn match_respondent(&self, respondent: &AttributeRecord) -> Result<GroupMatch> {
        let cluster_id = self.model()?.assign(respondent)?;
        let metadata = self.catalog()?.describe(&cluster_id)?.clone();
        let members = self.population()?.members_of(&cluster_id);
        let aggregate = aggregate(members);

        debug!(
            cluster = %cluster_id,
            members = aggregate.member_count(),
            "respondent matched"
        );

        Ok(GroupMatch {
            cluster_id,
            metadata,
            aggregate,
        })
    }

    /// Load everything and cross-check model, catalog and population.
    pub fn health_check(&self) -> Result<ValidationReport> {
        let model = self.model()?;
        let catalog = self.catalog()?;
        let population = self.population()?;
        let report = check_consistency(model, catalog, population);
        for issue in &report.issues {
            match issue.severity {
                Severity::Info => debug!(%issue, "consistency check"),
                _ => warn!(%issue, "consistency check"),
            }
        }
        Ok(report)
    }
}

impl<S> std::fmt::Debug for MatchContext<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchContext")
            .field("model_loaded", &self.model.get().is_some())
            .field("catalog_loaded", &self.catalog.get().is_some())
            .field("population_loaded", &self.population.get().is_some())
            .finish()
    }
}
