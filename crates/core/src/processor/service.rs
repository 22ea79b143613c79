//! Receipt processing pipeline.

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::categorize::{ClassificationError, TextClassifier, categorize};
use crate::extraction::{ExtractedReceipt, ExtractionError, VisionExtractor};

/// Pipeline failure: either stage aborts the upload.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The vision stage failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The categorization stage failed.
    #[error(transparent)]
    Classification(#[from] ClassificationError),
}

/// A category the pipeline may assign, as (id, slug).
#[derive(Debug, Clone)]
pub struct CategoryOption {
    /// Category ID.
    pub id: Uuid,
    /// Category slug.
    pub slug: String,
}

/// The pipeline's output, ready to persist.
#[derive(Debug, Clone)]
pub struct ProcessedReceipt {
    /// Typed extraction fields.
    pub receipt: ExtractedReceipt,
    /// Raw extraction payload, retained for audit.
    pub raw: Value,
    /// Resolved category, if any.
    pub category_id: Option<Uuid>,
    /// Resolved category slug, if any.
    pub category_slug: Option<String>,
    /// Categorization confidence.
    pub confidence: f64,
}

/// Composes the extraction gateway and categorization engine.
///
/// One model client serves both stages in production; tests substitute a
/// double implementing the same two traits.
#[derive(Debug, Clone)]
pub struct ReceiptProcessor<M> {
    model: M,
}

impl<M: VisionExtractor + TextClassifier> ReceiptProcessor<M> {
    /// Creates a new processor around a model client.
    #[must_use]
    pub const fn new(model: M) -> Self {
        Self { model }
    }

    /// Runs the full pipeline on one image.
    ///
    /// # Errors
    ///
    /// Returns a `ProcessError` when extraction or categorization fails;
    /// nothing may be persisted in that case.
    pub async fn process(
        &self,
        image_bytes: &[u8],
        media_type: &str,
        categories: &[CategoryOption],
    ) -> Result<ProcessedReceipt, ProcessError> {
        let extraction = self.model.extract(image_bytes, media_type).await?;

        let available_slugs: Vec<String> =
            categories.iter().map(|c| c.slug.clone()).collect();

        let categorization = categorize(
            &self.model,
            extraction.receipt.merchant_name.as_deref(),
            &extraction.receipt.line_items,
            &available_slugs,
        )
        .await?;

        let category_id = categorization.slug.as_ref().and_then(|slug| {
            categories
                .iter()
                .find(|c| &c.slug == slug)
                .map(|c| c.id)
        });

        Ok(ProcessedReceipt {
            receipt: extraction.receipt,
            raw: extraction.raw,
            category_id,
            category_slug: categorization.slug,
            confidence: categorization.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::ClassifierVerdict;
    use crate::extraction::Extraction;
    use rust_decimal_macros::dec;
    use serde_json::json;

    /// Model double implementing both pipeline stages.
    struct FakeModel {
        merchant: Option<&'static str>,
        classifier_slug: &'static str,
        fail_extraction: bool,
    }

    impl VisionExtractor for FakeModel {
        async fn extract(
            &self,
            _image_bytes: &[u8],
            _media_type: &str,
        ) -> Result<Extraction, ExtractionError> {
            if self.fail_extraction {
                return Err(ExtractionError::MissingGrandTotal);
            }
            Ok(Extraction {
                receipt: ExtractedReceipt {
                    merchant_name: self.merchant.map(String::from),
                    transaction_date: None,
                    subtotal: None,
                    tax: None,
                    tip: None,
                    grand_total: dec!(20.00),
                    payment_method: None,
                    line_items: Vec::new(),
                },
                raw: json!({"grand_total": 20.0}),
            })
        }
    }

    impl TextClassifier for FakeModel {
        async fn classify(
            &self,
            _merchant_name: Option<&str>,
            _item_descriptions: &[String],
            _valid_slugs: &[String],
        ) -> Result<ClassifierVerdict, ClassificationError> {
            Ok(ClassifierVerdict {
                slug: self.classifier_slug.to_string(),
                confidence: 0.6,
            })
        }
    }

    fn options(pairs: &[(&str, Uuid)]) -> Vec<CategoryOption> {
        pairs
            .iter()
            .map(|(slug, id)| CategoryOption {
                id: *id,
                slug: (*slug).to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_rule_winner_maps_to_category_id() {
        let coffee_id = Uuid::new_v4();
        let categories = options(&[("coffee", coffee_id), ("other", Uuid::new_v4())]);

        let processor = ReceiptProcessor::new(FakeModel {
            merchant: Some("Starbucks"),
            classifier_slug: "other",
            fail_extraction: false,
        });

        let processed = processor.process(b"img", "image/png", &categories).await.unwrap();

        assert_eq!(processed.category_id, Some(coffee_id));
        assert_eq!(processed.category_slug.as_deref(), Some("coffee"));
        assert!(processed.confidence > 0.9);
        assert_eq!(processed.receipt.grand_total, dec!(20.00));
    }

    #[tokio::test]
    async fn test_unknown_merchant_uses_classifier() {
        let dining_id = Uuid::new_v4();
        let categories = options(&[("dining", dining_id)]);

        let processor = ReceiptProcessor::new(FakeModel {
            merchant: Some("Joe's Hardware Emporium"),
            classifier_slug: "dining",
            fail_extraction: false,
        });

        let processed = processor.process(b"img", "image/png", &categories).await.unwrap();

        assert_eq!(processed.category_id, Some(dining_id));
        assert!(processed.confidence > 0.5 && processed.confidence < 0.7);
    }

    #[tokio::test]
    async fn test_extraction_failure_aborts_pipeline() {
        let processor = ReceiptProcessor::new(FakeModel {
            merchant: None,
            classifier_slug: "dining",
            fail_extraction: true,
        });

        let result = processor.process(b"img", "image/png", &[]).await;
        assert!(matches!(result, Err(ProcessError::Extraction(_))));
    }

    #[tokio::test]
    async fn test_raw_payload_carried_for_audit() {
        let categories = options(&[("coffee", Uuid::new_v4())]);
        let processor = ReceiptProcessor::new(FakeModel {
            merchant: Some("Starbucks"),
            classifier_slug: "coffee",
            fail_extraction: false,
        });

        let processed = processor.process(b"img", "image/png", &categories).await.unwrap();
        assert_eq!(processed.raw["grand_total"], 20.0);
    }
}
