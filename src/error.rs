//! Error types for contiguity and pattern-statistics operations.

use thiserror::Error;

use crate::feature::FeatureId;

/// Structural problems with an input geometry. Always fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Null, empty, non-finite or otherwise unusable geometry.
    #[error("Invalid geometry for feature {id}: {reason}")]
    Invalid { id: FeatureId, reason: String },

    /// A polygon ring crosses or overlaps itself.
    #[error("Self-intersecting geometry for feature {id}")]
    SelfIntersecting { id: FeatureId },
}

/// Main error type for weights construction and statistics.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Bad parameters, detected before any computation starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Insufficient data: need at least {required} usable records, found {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("Duplicate feature id: {0}")]
    DuplicateId(FeatureId),

    #[error("Unknown feature id: {0}")]
    UnknownFeature(FeatureId),

    /// The monitor requested cancellation; no partial result is produced.
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
