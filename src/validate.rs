//! Consistency checks across model, catalog and population.
//!
//! Detects deployment mismatches before a respondent trips over them:
//! - Model clusters with no catalog entry (every match would fail)
//! - Catalog entries the model never produces
//! - Blank names or descriptions
//! - Clusters with no reference members
//!
//! # Example
//!
//! ```rust,ignore
//! let report = context.health_check()?;
//! if !report.is_healthy() {
//!     for issue in report.issues {
//!         eprintln!("{}: {}", issue.severity, issue.message);
//!     }
//! }
//! ```

use std::collections::{HashMap, HashSet};

use crate::catalog::ClusterCatalog;
use crate::cluster::{ClusterId, ClusterModel};
use crate::population::ReferencePopulation;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational, not a problem.
    Info,
    /// Something unusual but not necessarily wrong.
    Warning,
    /// A problem that should be fixed.
    Error,
    /// A critical issue that will cause failures.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A single finding.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Cluster involved, if any.
    pub cluster: Option<ClusterId>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            cluster: None,
        }
    }

    /// Attach the cluster this issue concerns.
    pub fn with_cluster(mut self, id: ClusterId) -> Self {
        self.cluster = Some(id);
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(id) = &self.cluster {
            write!(f, " (cluster {})", id)?;
        }
        Ok(())
    }
}

/// Report from a consistency check.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// All issues found.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Check if the report contains no errors or critical issues.
    pub fn is_healthy(&self) -> bool {
        !self.issues.iter().any(|i| i.severity >= Severity::Error)
    }

    /// Check if there are any issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Get issues of a specific severity or higher.
    pub fn issues_at_level(&self, min_severity: Severity) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity >= min_severity)
            .collect()
    }

    /// Count issues by severity.
    pub fn counts(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_default() += 1;
        }
        counts
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_clean() {
            return write!(f, "Validation passed: no issues found");
        }

        let counts = self.counts();
        write!(f, "Validation report: ")?;

        let parts: Vec<String> = [
            (Severity::Critical, "critical"),
            (Severity::Error, "errors"),
            (Severity::Warning, "warnings"),
            (Severity::Info, "info"),
        ]
        .iter()
        .filter_map(|(sev, name)| counts.get(sev).map(|c| format!("{} {}", c, name)))
        .collect();

        writeln!(f, "{}", parts.join(", "))?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// Cross-check a loaded model, catalog and population.
pub fn check_consistency<M: ClusterModel + ?Sized>(
    model: &M,
    catalog: &ClusterCatalog,
    population: &ReferencePopulation,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    let model_ids = model.cluster_ids();
    let produced: HashSet<&ClusterId> = model_ids.iter().collect();

    for id in &model_ids {
        if !catalog.contains(id) {
            report.add(
                ValidationIssue::new(Severity::Critical, "model cluster has no catalog entry")
                    .with_cluster(id.clone()),
            );
        }
    }

    for (id, meta) in catalog.iter() {
        if !produced.contains(id) {
            report.add(
                ValidationIssue::new(Severity::Warning, "catalog entry is never produced by the model")
                    .with_cluster(id.clone()),
            );
        }
        if meta.name.trim().is_empty() || meta.description.trim().is_empty() {
            report.add(
                ValidationIssue::new(Severity::Warning, "catalog entry has a blank name or description")
                    .with_cluster(id.clone()),
            );
        }
    }

    let sizes = population.cluster_sizes();
    for id in &model_ids {
        if !sizes.contains_key(id) {
            report.add(
                ValidationIssue::new(Severity::Info, "cluster has no reference members")
                    .with_cluster(id.clone()),
            );
        }
    }

    // Labels come from the same model, so this only fires for hand-built populations.
    for id in sizes.keys() {
        if !produced.contains(id) {
            report.add(
                ValidationIssue::new(Severity::Error, "population label is not a model cluster")
                    .with_cluster(id.clone()),
            );
        }
    }

    report
}
