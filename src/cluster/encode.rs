//! One-hot encoding of attribute records.
//!
//! Each attribute owns a contiguous block of columns, one per domain value,
//! laid out in schema order:
//!
//! ```text
//! │ age (8) │ edu_level (3) │ fav_animals (5) │ fav_place (4) │ gender (2) │
//! ```
//!
//! A record sets exactly one column per block to 1.0. In lenient mode an
//! out-of-domain value leaves its block at zero, which places the record at
//! equal distance from every centroid along that attribute.

use ndarray::Array1;

use crate::error::{Error, Result};
use crate::schema::{Attribute, AttributeRecord, Schema};

/// Maps records onto fixed-width one-hot vectors.
#[derive(Debug, Clone)]
pub struct OneHotEncoder {
    schema: Schema,
    offsets: [usize; 5],
    width: usize,
}

impl OneHotEncoder {
    /// Create an encoder for `schema`.
    pub fn new(schema: Schema) -> Self {
        let mut offsets = [0; 5];
        let mut width = 0;
        for attribute in Attribute::ALL {
            offsets[attribute.index()] = width;
            width += schema.domain(attribute).len();
        }
        Self {
            schema,
            offsets,
            width,
        }
    }

    /// The schema this encoder lays out.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Encoded vector length.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Column index of `(attribute, value)`, if the value is in-domain.
    pub fn column(&self, attribute: Attribute, value: &str) -> Option<usize> {
        self.schema
            .position(attribute, value)
            .map(|p| self.offsets[attribute.index()] + p)
    }

    /// Column names as `attribute=value`, in column order.
    pub fn feature_names(&self) -> Vec<String> {
        Attribute::ALL
            .into_iter()
            .flat_map(|a| {
                self.schema
                    .domain(a)
                    .iter()
                    .map(move |v| format!("{}={}", a.name(), v))
            })
            .collect()
    }

    /// Encode `record`.
    ///
    /// With `strict`, an out-of-domain value is a [`Error::SchemaViolation`].
    pub fn encode(&self, record: &AttributeRecord, strict: bool) -> Result<Array1<f32>> {
        let mut out = Array1::zeros(self.width);
        for (attribute, value) in record.iter() {
            match self.column(attribute, value) {
                Some(col) => out[col] = 1.0,
                None if strict => {
                    return Err(Error::SchemaViolation {
                        attribute,
                        value: value.to_string(),
                    })
                }
                None => {}
            }
        }
        Ok(out)
    }
}
