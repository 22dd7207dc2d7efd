//! Group aggregation: member count and per-attribute frequency tables.
//!
//! ```text
//! members ──► member_count = |members|
//!         └─► for each attribute: value ──► count
//! ```
//!
//! Every table of a non-empty group sums to `member_count`, since each member
//! contributes exactly one value per attribute. Counts are raw; turning them
//! into shares is left to whoever renders them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::population::LabeledRecord;
use crate::schema::{Attribute, AttributeRecord, Schema};

/// Descriptive summary of one cluster's members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupAggregate {
    member_count: usize,
    distributions: BTreeMap<Attribute, BTreeMap<String, usize>>,
}

impl GroupAggregate {
    /// Tally `members`.
    ///
    /// An empty group is valid: `member_count` is 0 and every attribute maps
    /// to an empty table.
    pub fn from_records<'a, I>(members: I) -> Self
    where
        I: IntoIterator<Item = &'a AttributeRecord>,
    {
        let mut distributions: BTreeMap<Attribute, BTreeMap<String, usize>> = Attribute::ALL
            .into_iter()
            .map(|a| (a, BTreeMap::new()))
            .collect();
        let mut member_count = 0;

        for record in members {
            member_count += 1;
            for (attribute, value) in record.iter() {
                if let Some(table) = distributions.get_mut(&attribute) {
                    *table.entry(value.to_string()).or_insert(0) += 1;
                }
            }
        }

        Self {
            member_count,
            distributions,
        }
    }

    /// Number of members.
    pub fn member_count(&self) -> usize {
        self.member_count
    }

    /// `value -> count` for `attribute`, sorted by value.
    pub fn distribution(&self, attribute: Attribute) -> &BTreeMap<String, usize> {
        // Every attribute is inserted by `from_records`.
        &self.distributions[&attribute]
    }

    /// All tables, keyed by attribute.
    pub fn distributions(&self) -> &BTreeMap<Attribute, BTreeMap<String, usize>> {
        &self.distributions
    }

    /// Members answering `value` for `attribute`.
    pub fn count(&self, attribute: Attribute, value: &str) -> usize {
        self.distribution(attribute).get(value).copied().unwrap_or(0)
    }

    /// Observed values of `attribute` in `schema` domain order, then any
    /// out-of-domain values sorted. Values with no members are omitted.
    pub fn ordered(&self, attribute: Attribute, schema: &Schema) -> Vec<(String, usize)> {
        let table = self.distribution(attribute);
        let mut rows: Vec<(String, usize)> = schema
            .domain(attribute)
            .iter()
            .filter_map(|v| table.get(v).map(|&c| (v.clone(), c)))
            .collect();
        rows.extend(
            table
                .iter()
                .filter(|(v, _)| !schema.contains(attribute, v))
                .map(|(v, &c)| (v.clone(), c)),
        );
        rows
    }

    /// Most frequent value of `attribute`; ties go to the smallest value.
    pub fn most_common(&self, attribute: Attribute) -> Option<(&str, usize)> {
        self.distribution(attribute)
            .iter()
            .fold(None::<(&str, usize)>, |best, (v, &c)| match best {
                Some((_, bc)) if bc >= c => best,
                _ => Some((v.as_str(), c)),
            })
    }
}

/// Tally a cluster's labeled members.
pub fn aggregate<'a, I>(members: I) -> GroupAggregate
where
    I: IntoIterator<Item = &'a LabeledRecord>,
{
    GroupAggregate::from_records(members.into_iter().map(|m| &m.record))
}
