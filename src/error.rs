use crate::cluster::ClusterId;
use crate::schema::Attribute;

/// Result alias for `cohort`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the matching engine.
///
/// The engine never recovers locally: each variant reaches the caller of
/// [`crate::MatchContext::match_respondent`] unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The cluster model artifact is missing, unreadable, or malformed.
    #[error("cluster model unavailable: {reason}")]
    ModelUnavailable {
        /// What went wrong while obtaining the model.
        reason: String,
    },

    /// A field value lies outside its declared domain (strict validation).
    #[error("value '{value}' is not in the domain of attribute '{attribute}'")]
    SchemaViolation {
        /// Offending attribute.
        attribute: Attribute,
        /// Offending value.
        value: String,
    },

    /// The model produced an id the catalog has no entry for.
    #[error("cluster '{id}' has no catalog entry")]
    UnknownCluster {
        /// The unmatched id.
        id: ClusterId,
    },

    /// The reference population or catalog source could not be read or parsed.
    #[error("data unavailable: {reason}")]
    DataUnavailable {
        /// What went wrong while reading the source.
        reason: String,
    },

    /// Centroid width does not match the encoded record width.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },
}

impl Error {
    pub(crate) fn model(reason: impl Into<String>) -> Self {
        Error::ModelUnavailable {
            reason: reason.into(),
        }
    }

    pub(crate) fn data(reason: impl Into<String>) -> Self {
        Error::DataUnavailable {
            reason: reason.into(),
        }
    }
}
