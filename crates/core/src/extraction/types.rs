//! Extraction data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single line item on a receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Item description.
    #[serde(default)]
    pub description: Option<String>,
    /// Quantity purchased.
    #[serde(default)]
    pub quantity: Option<Decimal>,
    /// Total price for the line.
    #[serde(default)]
    pub total_price: Option<Decimal>,
}

/// Structured fields extracted from a receipt image.
///
/// `grand_total` is the only field the gateway guarantees; everything else
/// is whatever the model could read.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedReceipt {
    /// Merchant name, if legible.
    pub merchant_name: Option<String>,
    /// Transaction date, if printed and parseable.
    pub transaction_date: Option<NaiveDate>,
    /// Pre-tax subtotal.
    pub subtotal: Option<Decimal>,
    /// Tax amount.
    pub tax: Option<Decimal>,
    /// Tip amount.
    pub tip: Option<Decimal>,
    /// Grand total. Always present in a successful extraction.
    pub grand_total: Decimal,
    /// Payment method, if printed.
    pub payment_method: Option<String>,
    /// Line items, possibly empty.
    pub line_items: Vec<LineItem>,
}

/// A successful extraction: the typed fields plus the raw model payload.
///
/// The raw payload is retained verbatim on the receipt record for audit.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Typed receipt fields.
    pub receipt: ExtractedReceipt,
    /// The full parsed JSON payload as returned by the model.
    pub raw: serde_json::Value,
}
