//! Reference population: previously surveyed respondents, each labeled with
//! the cluster the *current* model assigns them.
//!
//! Labels are never taken from the source. A raw file may carry a `Cluster`
//! column from an earlier pipeline run; it is ignored so that respondent and
//! population assignments always come from the same model.
//!
//! # Raw source format
//!
//! Delimited text with a header row (`;` for the welcome survey):
//!
//! ```text
//! age;edu_level;fav_animals;fav_place;gender
//! 25-34;Wyższe;Koty i Psy;W górach;Kobieta
//! ```
//!
//! Columns are located by header name; extra columns are ignored. Quoted
//! fields may contain the delimiter. Empty cells become [`UNKNOWN`], which
//! every survey domain accepts.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterId, ClusterModel};
use crate::error::{Error, Result};
use crate::schema::{Attribute, AttributeRecord, UNKNOWN};

/// A record together with its assigned cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledRecord {
    /// The respondent's answers.
    pub record: AttributeRecord,
    /// Cluster assigned by the model at load time.
    pub cluster: ClusterId,
}

/// Read raw records from delimited text.
///
/// Fields follow RFC 4180 quoting. Every row must have exactly as many
/// fields as the header; errors name the source line.
pub fn read_records<R: Read>(reader: R, delimiter: char) -> Result<Vec<AttributeRecord>> {
    if !delimiter.is_ascii() {
        return Err(Error::InvalidParameter {
            name: "delimiter",
            message: "must be a single ASCII character",
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header = reader.headers().map_err(csv_error)?.clone();
    if header.is_empty() {
        return Err(Error::data("population source is empty"));
    }
    let mut positions = [0usize; 5];
    for attribute in Attribute::ALL {
        positions[attribute.index()] = header
            .iter()
            .position(|c| c.trim_start_matches('\u{feff}') == attribute.name())
            .ok_or_else(|| Error::data(format!("missing column '{}'", attribute.name())))?;
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let values = positions.map(|p| match row.get(p) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => UNKNOWN.to_string(),
        });
        records.push(AttributeRecord::from_values(values));
    }

    Ok(records)
}

fn csv_error(err: csv::Error) -> Error {
    let line = err.position().map(|p| p.line());
    match (err.kind(), line) {
        (
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            },
            Some(line),
        ) => Error::data(format!(
            "line {line}: expected {expected_len} fields, found {len}"
        )),
        (_, Some(line)) => Error::data(format!("line {line}: {err}")),
        _ => Error::data(err.to_string()),
    }
}

/// Read raw records from a delimited file.
pub fn read_records_from_path(path: impl AsRef<Path>, delimiter: char) -> Result<Vec<AttributeRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| Error::data(format!("{}: {e}", path.display())))?;
    read_records(file, delimiter).map_err(|e| match e {
        Error::DataUnavailable { reason } => Error::data(format!("{}: {reason}", path.display())),
        other => other,
    })
}

/// The labeled reference population, grouped by cluster.
#[derive(Debug, Clone, Default)]
pub struct ReferencePopulation {
    records: Vec<LabeledRecord>,
    /// Record indices per cluster, in load order.
    by_cluster: BTreeMap<ClusterId, Vec<usize>>,
}

impl ReferencePopulation {
    /// Label every raw record with `model`.
    ///
    /// A record the model rejects makes the whole population unavailable;
    /// the error names the offending record (1-based position in `raw`).
    pub fn label<M: ClusterModel + ?Sized>(raw: Vec<AttributeRecord>, model: &M) -> Result<Self> {
        let ids = model.assign_all(&raw).map_err(|err| {
            match raw.iter().position(|r| model.assign(r).is_err()) {
                Some(i) => Error::data(format!("record {} cannot be labeled: {err}", i + 1)),
                None => Error::data(format!("population cannot be labeled: {err}")),
            }
        })?;

        let mut by_cluster: BTreeMap<ClusterId, Vec<usize>> = BTreeMap::new();
        let records: Vec<LabeledRecord> = raw
            .into_iter()
            .zip(ids)
            .enumerate()
            .map(|(i, (record, cluster))| {
                by_cluster.entry(cluster.clone()).or_default().push(i);
                LabeledRecord { record, cluster }
            })
            .collect();

        Ok(Self {
            records,
            by_cluster,
        })
    }

    /// Read a delimited file and label it with `model`.
    pub fn load<M: ClusterModel + ?Sized>(
        path: impl AsRef<Path>,
        delimiter: char,
        model: &M,
    ) -> Result<Self> {
        let raw = read_records_from_path(path, delimiter)?;
        Self::label(raw, model)
    }

    /// Members of `id`, in load order. Empty if the cluster has none.
    pub fn members_of(&self, id: &ClusterId) -> Vec<&LabeledRecord> {
        self.by_cluster
            .get(id)
            .map(|idx| idx.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// Member count per cluster that has at least one member.
    pub fn cluster_sizes(&self) -> BTreeMap<ClusterId, usize> {
        self.by_cluster
            .iter()
            .map(|(id, idx)| (id.clone(), idx.len()))
            .collect()
    }

    /// Clusters with at least one member.
    pub fn cluster_ids(&self) -> impl Iterator<Item = &ClusterId> {
        self.by_cluster.keys()
    }

    /// Every labeled record, in load order.
    pub fn records(&self) -> &[LabeledRecord] {
        &self.records
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
