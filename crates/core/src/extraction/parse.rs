//! Parsing of model responses into extraction results.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::error::ExtractionError;
use super::types::{ExtractedReceipt, Extraction, LineItem};

/// Raw response shape before the grand-total contract is enforced.
#[derive(Debug, Deserialize)]
struct RawExtraction {
    #[serde(default)]
    merchant_name: Option<String>,
    #[serde(default)]
    transaction_date: Option<String>,
    #[serde(default)]
    subtotal: Option<Decimal>,
    #[serde(default)]
    tax: Option<Decimal>,
    #[serde(default)]
    tip: Option<Decimal>,
    #[serde(default)]
    grand_total: Option<Decimal>,
    #[serde(default)]
    payment_method: Option<String>,
    #[serde(default)]
    line_items: Vec<LineItem>,
}

/// Strips a fenced code block wrapper, with optional language tag, from a
/// model reply.
///
/// Models sometimes wrap the JSON payload as ` ```json ... ``` `; the
/// payload itself is whatever sits between the fences. Input without a
/// leading fence is returned trimmed and otherwise untouched.
#[must_use]
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);

    // Drop an optional language tag: the remainder of the fence line, or a
    // bare "json" glued straight onto the payload.
    let rest = match rest.find('\n') {
        Some(idx) if rest[..idx].chars().all(|c| c.is_ascii_alphanumeric()) => &rest[idx + 1..],
        _ => rest.strip_prefix("json").unwrap_or(rest),
    };
    rest.trim()
}

/// Parses a model reply into an [`Extraction`].
///
/// # Errors
///
/// Returns `ExtractionError::Unparseable` when the reply is not JSON of the
/// expected shape and `ExtractionError::MissingGrandTotal` when the required
/// total is absent.
pub fn parse_extraction(text: &str) -> Result<Extraction, ExtractionError> {
    let payload = strip_code_fence(text);

    let raw: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| ExtractionError::Unparseable(e.to_string()))?;

    let fields: RawExtraction = serde_json::from_value(raw.clone())
        .map_err(|e| ExtractionError::Unparseable(e.to_string()))?;

    let grand_total = fields
        .grand_total
        .ok_or(ExtractionError::MissingGrandTotal)?;

    // An unparseable printed date is not an extraction failure; the field
    // is best-effort.
    let transaction_date = fields
        .transaction_date
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

    Ok(Extraction {
        receipt: ExtractedReceipt {
            merchant_name: fields.merchant_name,
            transaction_date,
            subtotal: fields.subtotal,
            tax: fields.tax,
            tip: fields.tip,
            grand_total,
            payment_method: fields.payment_method,
            line_items: fields.line_items,
        },
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const PAYLOAD: &str = r#"{
        "merchant_name": "Safeway",
        "transaction_date": "2024-03-15",
        "subtotal": 42.10,
        "tax": 2.53,
        "tip": null,
        "grand_total": 44.63,
        "payment_method": "VISA",
        "line_items": [
            {"description": "Milk", "quantity": 1, "total_price": 4.99}
        ]
    }"#;

    #[test]
    fn test_parse_bare_payload() {
        let extraction = parse_extraction(PAYLOAD).unwrap();
        let receipt = extraction.receipt;

        assert_eq!(receipt.merchant_name.as_deref(), Some("Safeway"));
        assert_eq!(
            receipt.transaction_date,
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(receipt.grand_total, dec!(44.63));
        assert_eq!(receipt.tip, None);
        assert_eq!(receipt.line_items.len(), 1);
        assert_eq!(
            receipt.line_items[0].description.as_deref(),
            Some("Milk")
        );
    }

    #[test]
    fn test_parse_fenced_payload_matches_bare() {
        let fenced = format!("```json\n{PAYLOAD}\n```");
        let a = parse_extraction(PAYLOAD).unwrap();
        let b = parse_extraction(&fenced).unwrap();
        assert_eq!(a.receipt.grand_total, b.receipt.grand_total);
        assert_eq!(a.raw, b.raw);
    }

    #[test]
    fn test_strip_fence_without_language_tag() {
        let fenced = format!("```\n{PAYLOAD}\n```");
        assert!(parse_extraction(&fenced).is_ok());
    }

    #[test]
    fn test_strip_fence_with_glued_language_tag() {
        // No newline after the tag: ```json{...}```
        let fenced = format!("```json{}```", r#"{"grand_total": 5.00}"#);
        assert!(parse_extraction(&fenced).is_ok());
    }

    #[test]
    fn test_strip_fence_passthrough() {
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_missing_grand_total_is_an_error() {
        let result = parse_extraction(r#"{"merchant_name": "Safeway"}"#);
        assert!(matches!(result, Err(ExtractionError::MissingGrandTotal)));
    }

    #[test]
    fn test_non_json_is_unparseable() {
        let result = parse_extraction("I could not read this receipt.");
        assert!(matches!(result, Err(ExtractionError::Unparseable(_))));
    }

    #[test]
    fn test_unparseable_date_is_dropped_not_fatal() {
        let extraction = parse_extraction(
            r#"{"grand_total": 10.00, "transaction_date": "March 15th"}"#,
        )
        .unwrap();
        assert_eq!(extraction.receipt.transaction_date, None);
        assert_eq!(extraction.receipt.grand_total, dec!(10.00));
    }

    #[test]
    fn test_raw_payload_preserves_unknown_fields() {
        let extraction = parse_extraction(
            r#"{"grand_total": 5.00, "store_number": "0142"}"#,
        )
        .unwrap();
        assert_eq!(extraction.raw["store_number"], "0142");
    }
}
