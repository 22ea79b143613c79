//! Categorization error types.

use thiserror::Error;

use crate::anthropic::ModelError;

/// Errors from the categorization engine's probabilistic tier.
#[derive(Debug, Error)]
pub enum ClassificationError {
    /// The classifier response was not valid JSON of the expected shape.
    #[error("classifier response was not parseable: {0}")]
    Unparseable(String),

    /// The classifier picked a slug outside the valid list.
    #[error("classifier returned unknown slug: {0}")]
    UnknownSlug(String),

    /// The classifier response lacked a usable confidence value.
    #[error("classifier response is missing a confidence value")]
    MissingConfidence,

    /// The classifier reported a confidence outside `[0, 1]`.
    #[error("classifier confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),

    /// The upstream model call failed.
    #[error("classifier model call failed: {0}")]
    Upstream(#[from] ModelError),
}
