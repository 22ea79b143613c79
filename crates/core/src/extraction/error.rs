//! Extraction error types.

use thiserror::Error;

use crate::anthropic::ModelError;

/// Errors from the extraction gateway.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The model response was not valid JSON of the expected shape.
    #[error("extraction response was not parseable: {0}")]
    Unparseable(String),

    /// The response parsed but lacked the required grand total.
    #[error("extraction response is missing grand_total")]
    MissingGrandTotal,

    /// The upstream model call failed.
    #[error("vision model call failed: {0}")]
    Upstream(#[from] ModelError),
}
