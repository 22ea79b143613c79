//! The categorization pipeline.

use super::TextClassifier;
use super::error::ClassificationError;
use super::rules::match_merchant_rule;
use super::types::Categorization;
use crate::extraction::LineItem;

/// Conventional slug a winning-but-unavailable category resolves to.
pub const FALLBACK_SLUG: &str = "other";

/// How many line items are offered to the fallback classifier.
const CLASSIFIER_ITEM_LIMIT: usize = 5;

/// Assigns a category slug and confidence to extracted receipt data.
///
/// Stage order is fixed: the merchant-rule table first (skipped entirely
/// when there is no merchant name), then the probabilistic classifier when
/// the rules produced no match or a slug that is not available. The winning
/// slug then goes through [`resolve_slug`]; the winning tier's confidence
/// survives resolution untouched.
///
/// # Errors
///
/// Returns a `ClassificationError` when the fallback tier is consulted and
/// the classifier fails, picks a slug outside `available_slugs`, or reports
/// a confidence outside `[0, 1]`.
pub async fn categorize<C: TextClassifier>(
    classifier: &C,
    merchant_name: Option<&str>,
    line_items: &[LineItem],
    available_slugs: &[String],
) -> Result<Categorization, ClassificationError> {
    let rule_hit = merchant_name.and_then(match_merchant_rule);

    let (slug, confidence) = match rule_hit {
        Some(rule) if available_slugs.iter().any(|s| s == rule.slug) => {
            (rule.slug.to_string(), rule.confidence)
        }
        _ => {
            let descriptions: Vec<String> = line_items
                .iter()
                .take(CLASSIFIER_ITEM_LIMIT)
                .map(|item| item.description.clone().unwrap_or_default())
                .collect();

            let verdict = classifier
                .classify(merchant_name, &descriptions, available_slugs)
                .await?;

            if !available_slugs.contains(&verdict.slug) {
                return Err(ClassificationError::UnknownSlug(verdict.slug));
            }
            if !(0.0..=1.0).contains(&verdict.confidence) {
                return Err(ClassificationError::ConfidenceOutOfRange(verdict.confidence));
            }

            (verdict.slug, verdict.confidence)
        }
    };

    Ok(Categorization {
        slug: resolve_slug(slug, available_slugs),
        confidence,
    })
}

/// Resolves a winning slug against the available set.
///
/// A slug that is not available resolves to [`FALLBACK_SLUG`] when that
/// exists among `available_slugs`, otherwise to no category at all.
#[must_use]
pub fn resolve_slug(slug: String, available_slugs: &[String]) -> Option<String> {
    if available_slugs.contains(&slug) {
        Some(slug)
    } else if available_slugs.iter().any(|s| s == FALLBACK_SLUG) {
        Some(FALLBACK_SLUG.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::types::ClassifierVerdict;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Classifier double returning a fixed verdict and counting calls.
    struct FixedClassifier {
        slug: &'static str,
        confidence: f64,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(slug: &'static str, confidence: f64) -> Self {
            Self {
                slug,
                confidence,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextClassifier for FixedClassifier {
        async fn classify(
            &self,
            _merchant_name: Option<&str>,
            _item_descriptions: &[String],
            _valid_slugs: &[String],
        ) -> Result<ClassifierVerdict, ClassificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ClassifierVerdict {
                slug: self.slug.to_string(),
                confidence: self.confidence,
            })
        }
    }

    fn slugs(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_rule_match_never_consults_classifier() {
        let classifier = FixedClassifier::new("groceries", 0.5);
        let available = slugs(&["coffee", "groceries", "other"]);

        let result = categorize(&classifier, Some("Starbucks Reserve"), &[], &available)
            .await
            .unwrap();

        assert_eq!(result.slug.as_deref(), Some("coffee"));
        assert!(result.confidence > 0.9);
        assert_eq!(classifier.call_count(), 0);
    }

    #[tokio::test]
    async fn test_absent_merchant_always_falls_through() {
        let classifier = FixedClassifier::new("groceries", 0.6);
        let available = slugs(&["coffee", "groceries"]);

        let result = categorize(&classifier, None, &[], &available).await.unwrap();

        assert_eq!(result.slug.as_deref(), Some("groceries"));
        assert_eq!(classifier.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rule_slug_unavailable_falls_through() {
        // "Starbucks" maps to "coffee", but this household has no coffee
        // category, so the classifier gets the final say.
        let classifier = FixedClassifier::new("dining", 0.55);
        let available = slugs(&["dining", "groceries"]);

        let result = categorize(&classifier, Some("Starbucks"), &[], &available)
            .await
            .unwrap();

        assert_eq!(result.slug.as_deref(), Some("dining"));
        assert_eq!(classifier.call_count(), 1);
    }

    #[tokio::test]
    async fn test_classifier_unknown_slug_is_an_error() {
        let classifier = FixedClassifier::new("yachts", 0.9);
        let available = slugs(&["dining", "other"]);

        let result = categorize(&classifier, None, &[], &available).await;
        assert!(matches!(result, Err(ClassificationError::UnknownSlug(_))));
    }

    #[tokio::test]
    async fn test_classifier_confidence_out_of_range_is_an_error() {
        let classifier = FixedClassifier::new("dining", 1.5);
        let available = slugs(&["dining"]);

        let result = categorize(&classifier, None, &[], &available).await;
        assert!(matches!(
            result,
            Err(ClassificationError::ConfidenceOutOfRange(_))
        ));
    }

    #[tokio::test]
    async fn test_classifier_sees_first_five_descriptions_only() {
        struct CountingClassifier;

        impl TextClassifier for CountingClassifier {
            async fn classify(
                &self,
                _merchant_name: Option<&str>,
                item_descriptions: &[String],
                valid_slugs: &[String],
            ) -> Result<ClassifierVerdict, ClassificationError> {
                assert_eq!(item_descriptions.len(), 5);
                Ok(ClassifierVerdict {
                    slug: valid_slugs[0].clone(),
                    confidence: 0.4,
                })
            }
        }

        let items: Vec<LineItem> = (0..8)
            .map(|i| LineItem {
                description: Some(format!("item {i}")),
                quantity: None,
                total_price: None,
            })
            .collect();

        let result = categorize(&CountingClassifier, None, &items, &slugs(&["other"]))
            .await
            .unwrap();
        assert_eq!(result.slug.as_deref(), Some("other"));
    }

    #[test]
    fn test_resolve_slug_available_passes_through() {
        let available = slugs(&["dining", "other"]);
        assert_eq!(
            resolve_slug("dining".to_string(), &available).as_deref(),
            Some("dining")
        );
    }

    #[test]
    fn test_resolve_slug_substitutes_other() {
        let available = slugs(&["dining", "other"]);
        assert_eq!(
            resolve_slug("yachts".to_string(), &available).as_deref(),
            Some("other")
        );
    }

    #[test]
    fn test_resolve_slug_without_other_resolves_to_none() {
        let available = slugs(&["dining"]);
        assert_eq!(resolve_slug("yachts".to_string(), &available), None);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::categorize::types::ClassifierVerdict;
    use proptest::prelude::*;

    struct EchoClassifier {
        confidence: f64,
    }

    impl TextClassifier for EchoClassifier {
        async fn classify(
            &self,
            _merchant_name: Option<&str>,
            _item_descriptions: &[String],
            valid_slugs: &[String],
        ) -> Result<ClassifierVerdict, ClassificationError> {
            Ok(ClassifierVerdict {
                slug: valid_slugs[0].clone(),
                confidence: self.confidence,
            })
        }
    }

    // Every confidence the engine emits is within [0, 1], whichever tier
    // wins and whatever the merchant name looks like.
    proptest! {
        #[test]
        fn prop_confidence_always_in_unit_interval(
            merchant in proptest::option::of("[a-zA-Z ]{0,30}"),
            confidence in 0.0f64..=1.0,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");

            let classifier = EchoClassifier { confidence };
            let available: Vec<String> =
                vec!["coffee".into(), "dining".into(), "groceries".into(),
                     "transportation".into(), "shopping".into(), "other".into()];

            let result = rt
                .block_on(categorize(
                    &classifier,
                    merchant.as_deref(),
                    &[],
                    &available,
                ))
                .expect("categorize");

            prop_assert!(result.confidence >= 0.0);
            prop_assert!(result.confidence <= 1.0);
            prop_assert!(result.slug.is_some());
        }
    }
}
