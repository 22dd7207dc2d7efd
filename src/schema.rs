//! Attribute schema: the fixed set of categorical attributes describing a
//! respondent, and the value domain each attribute permits.
//!
//! ```text
//! Attribute    │ Domain (survey default)
//! ─────────────┼──────────────────────────────────────────────
//! age          │ <18, 18-24, 25-34, 35-44, 45-54, 55-64, >=65, unknown
//! edu_level    │ Podstawowe, Średnie, Wyższe, unknown
//! fav_animals  │ Brak ulubionych, Psy, Koty, Inne, Koty i Psy, unknown
//! fav_place    │ Nad wodą, W lesie, W górach, Inne, unknown
//! gender       │ Mężczyzna, Kobieta, unknown
//! ```
//!
//! [`UNKNOWN`] closes every survey domain, so a skipped answer is a valid
//! value rather than a violation.
//!
//! Domain order matters: it fixes the one-hot column layout used by
//! [`crate::cluster::OneHotEncoder`] and the row order of
//! [`crate::aggregate::GroupAggregate::ordered`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sentinel for an answer the respondent did not give.
pub const UNKNOWN: &str = "unknown";

/// One of the five categorical attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Age bracket.
    Age,
    /// Education level.
    EduLevel,
    /// Favorite animals.
    FavAnimals,
    /// Favorite place.
    FavPlace,
    /// Gender.
    Gender,
}

impl Attribute {
    /// All attributes, in schema order.
    pub const ALL: [Attribute; 5] = [
        Attribute::Age,
        Attribute::EduLevel,
        Attribute::FavAnimals,
        Attribute::FavPlace,
        Attribute::Gender,
    ];

    /// Column name used in sources and artifacts.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::Age => "age",
            Attribute::EduLevel => "edu_level",
            Attribute::FavAnimals => "fav_animals",
            Attribute::FavPlace => "fav_place",
            Attribute::Gender => "gender",
        }
    }

    /// Position in [`Attribute::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Attribute::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("unknown attribute '{s}'"))
    }
}

/// Permitted value domains, one per attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    domains: [Vec<String>; 5],
}

impl Schema {
    /// Create a schema from explicit domains, indexed like [`Attribute::ALL`].
    pub fn new(domains: [Vec<String>; 5]) -> Self {
        Self { domains }
    }

    /// The welcome-survey schema.
    pub fn survey() -> Self {
        fn owned(values: &[&str]) -> Vec<String> {
            values.iter().map(|v| (*v).to_string()).collect()
        }

        Self::new([
            owned(&[
                "<18", "18-24", "25-34", "35-44", "45-54", "55-64", ">=65", UNKNOWN,
            ]),
            owned(&["Podstawowe", "Średnie", "Wyższe", UNKNOWN]),
            owned(&["Brak ulubionych", "Psy", "Koty", "Inne", "Koty i Psy", UNKNOWN]),
            owned(&["Nad wodą", "W lesie", "W górach", "Inne", UNKNOWN]),
            owned(&["Mężczyzna", "Kobieta", UNKNOWN]),
        ])
    }

    /// Permitted values of `attribute`, in domain order.
    pub fn domain(&self, attribute: Attribute) -> &[String] {
        &self.domains[attribute.index()]
    }

    /// Position of `value` within the domain of `attribute`.
    pub fn position(&self, attribute: Attribute, value: &str) -> Option<usize> {
        self.domain(attribute).iter().position(|v| v == value)
    }

    /// Whether `value` is permitted for `attribute`.
    pub fn contains(&self, attribute: Attribute, value: &str) -> bool {
        self.position(attribute, value).is_some()
    }

    /// Check every field of `record` against its domain.
    ///
    /// Reports the first offending attribute in schema order.
    pub fn validate(&self, record: &AttributeRecord) -> Result<()> {
        for attribute in Attribute::ALL {
            let value = record.get(attribute);
            if !self.contains(attribute, value) {
                return Err(Error::SchemaViolation {
                    attribute,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Total one-hot width: the sum of all domain sizes.
    pub fn width(&self) -> usize {
        self.domains.iter().map(Vec::len).sum()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::survey()
    }
}

/// One respondent's answers.
///
/// Immutable after construction. Values are kept as given; conformance to a
/// [`Schema`] is checked by [`Schema::validate`] or by a strict model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeRecord {
    age: String,
    edu_level: String,
    fav_animals: String,
    fav_place: String,
    gender: String,
}

impl AttributeRecord {
    /// Create a record from its five fields.
    pub fn new(
        age: impl Into<String>,
        edu_level: impl Into<String>,
        fav_animals: impl Into<String>,
        fav_place: impl Into<String>,
        gender: impl Into<String>,
    ) -> Self {
        Self {
            age: age.into(),
            edu_level: edu_level.into(),
            fav_animals: fav_animals.into(),
            fav_place: fav_place.into(),
            gender: gender.into(),
        }
    }

    /// Build from values ordered like [`Attribute::ALL`].
    pub fn from_values(values: [String; 5]) -> Self {
        let [age, edu_level, fav_animals, fav_place, gender] = values;
        Self {
            age,
            edu_level,
            fav_animals,
            fav_place,
            gender,
        }
    }

    /// Value of `attribute`.
    pub fn get(&self, attribute: Attribute) -> &str {
        match attribute {
            Attribute::Age => &self.age,
            Attribute::EduLevel => &self.edu_level,
            Attribute::FavAnimals => &self.fav_animals,
            Attribute::FavPlace => &self.fav_place,
            Attribute::Gender => &self.gender,
        }
    }

    /// Age bracket.
    pub fn age(&self) -> &str {
        &self.age
    }

    /// Education level.
    pub fn edu_level(&self) -> &str {
        &self.edu_level
    }

    /// Favorite animals.
    pub fn fav_animals(&self) -> &str {
        &self.fav_animals
    }

    /// Favorite place.
    pub fn fav_place(&self) -> &str {
        &self.fav_place
    }

    /// Gender.
    pub fn gender(&self) -> &str {
        &self.gender
    }

    /// `(attribute, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (Attribute, &str)> + '_ {
        Attribute::ALL.into_iter().map(move |a| (a, self.get(a)))
    }
}
