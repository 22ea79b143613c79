//! Receipt extraction via an external vision model.
//!
//! The gateway turns a receipt image into structured purchase fields. A
//! successful extraction always carries a grand total; every other field is
//! best-effort. One external round trip, no retries.

mod anthropic;
mod error;
mod parse;
mod types;

pub use error::ExtractionError;
pub use parse::{parse_extraction, strip_code_fence};
pub use types::{ExtractedReceipt, Extraction, LineItem};

/// Vision extraction capability.
///
/// Implemented by the production model client and by test doubles.
pub trait VisionExtractor: Send + Sync {
    /// Extracts structured receipt fields from an image.
    fn extract(
        &self,
        image_bytes: &[u8],
        media_type: &str,
    ) -> impl std::future::Future<Output = Result<Extraction, ExtractionError>> + Send;
}
