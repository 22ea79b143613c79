//! Receipt categorization.
//!
//! Two classification stages composed in a fixed order: the deterministic
//! merchant-rule table first, a probabilistic classifier second. The order
//! is part of the contract — rules always get the first look, and the
//! fallback only runs when the rules produced nothing usable.

mod anthropic;
mod engine;
mod error;
mod rules;
mod types;

pub use engine::{FALLBACK_SLUG, categorize, resolve_slug};
pub use error::ClassificationError;
pub use rules::{MERCHANT_RULES, MerchantRule, match_merchant_rule};
pub use types::{Categorization, ClassifierVerdict};

/// Probabilistic text classification capability.
///
/// Implemented by the production model client and by test doubles. The
/// classifier must pick a slug from `valid_slugs` and report a confidence
/// in `[0, 1]`; the engine rejects verdicts that violate either.
pub trait TextClassifier: Send + Sync {
    /// Classifies a merchant + item descriptions into one of `valid_slugs`.
    fn classify(
        &self,
        merchant_name: Option<&str>,
        item_descriptions: &[String],
        valid_slugs: &[String],
    ) -> impl std::future::Future<Output = Result<ClassifierVerdict, ClassificationError>> + Send;
}
