//! Categorization data types.

use serde::{Deserialize, Serialize};

/// A classifier's raw answer, before the engine validates it.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierVerdict {
    /// Chosen category slug.
    pub slug: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

/// The engine's final answer for one receipt.
#[derive(Debug, Clone, Serialize)]
pub struct Categorization {
    /// Resolved category slug; `None` when no category could be assigned
    /// and no `other` fallback exists.
    pub slug: Option<String>,
    /// Confidence of the winning tier, preserved through slug resolution.
    pub confidence: f64,
}
