//! Fallback classification backed by the Anthropic Messages API.

use serde::Deserialize;

use super::TextClassifier;
use super::error::ClassificationError;
use super::types::ClassifierVerdict;
use crate::anthropic::{AnthropicClient, ContentBlock};
use crate::extraction::strip_code_fence;

const CLASSIFY_MAX_TOKENS: u32 = 100;

/// Response shape the classifier prompt asks for.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

fn build_prompt(
    merchant_name: Option<&str>,
    item_descriptions: &[String],
    valid_slugs: &[String],
) -> String {
    let items = item_descriptions.join(", ");
    format!(
        r#"Based on this merchant name and items, assign a spending category.
Return ONLY valid JSON: {{"category": "category_slug", "confidence": 0.0-1.0}}

Valid category slugs: {slugs}

Merchant: {merchant}
Items: {items}"#,
        slugs = valid_slugs.join(", "),
        merchant = merchant_name.unwrap_or("Unknown"),
        items = if items.is_empty() {
            "Unknown"
        } else {
            items.as_str()
        },
    )
}

fn parse_verdict(text: &str) -> Result<ClassifierVerdict, ClassificationError> {
    let payload = strip_code_fence(text);

    let raw: RawVerdict = serde_json::from_str(payload)
        .map_err(|e| ClassificationError::Unparseable(e.to_string()))?;

    let slug = raw
        .category
        .ok_or_else(|| ClassificationError::Unparseable("missing category field".to_string()))?;
    let confidence = raw.confidence.ok_or(ClassificationError::MissingConfidence)?;

    Ok(ClassifierVerdict { slug, confidence })
}

impl TextClassifier for AnthropicClient {
    async fn classify(
        &self,
        merchant_name: Option<&str>,
        item_descriptions: &[String],
        valid_slugs: &[String],
    ) -> Result<ClassifierVerdict, ClassificationError> {
        let prompt = build_prompt(merchant_name, item_descriptions, valid_slugs);
        let content = [ContentBlock::Text { text: prompt }];

        let reply = self.complete(&content, CLASSIFY_MAX_TOKENS).await?;
        parse_verdict(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verdict() {
        let verdict = parse_verdict(r#"{"category": "dining", "confidence": 0.82}"#).unwrap();
        assert_eq!(verdict.slug, "dining");
        assert!(verdict.confidence > 0.8);
    }

    #[test]
    fn test_parse_verdict_fenced() {
        let verdict =
            parse_verdict("```json\n{\"category\": \"coffee\", \"confidence\": 0.9}\n```").unwrap();
        assert_eq!(verdict.slug, "coffee");
    }

    #[test]
    fn test_missing_confidence_is_an_error() {
        let result = parse_verdict(r#"{"category": "dining"}"#);
        assert!(matches!(result, Err(ClassificationError::MissingConfidence)));
    }

    #[test]
    fn test_unparseable_confidence_is_an_error() {
        let result = parse_verdict(r#"{"category": "dining", "confidence": "very sure"}"#);
        assert!(matches!(result, Err(ClassificationError::Unparseable(_))));
    }

    #[test]
    fn test_prompt_mentions_every_valid_slug() {
        let slugs = vec!["dining".to_string(), "coffee".to_string()];
        let prompt = build_prompt(Some("Cafe Milano"), &[], &slugs);
        assert!(prompt.contains("dining, coffee"));
        assert!(prompt.contains("Cafe Milano"));
        assert!(prompt.contains("Items: Unknown"));
    }
}
