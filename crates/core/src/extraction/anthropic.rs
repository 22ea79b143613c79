//! Vision extraction backed by the Anthropic Messages API.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::error::ExtractionError;
use super::parse::parse_extraction;
use super::types::Extraction;
use super::VisionExtractor;
use crate::anthropic::{AnthropicClient, ContentBlock, ImageSource};

const EXTRACTION_MAX_TOKENS: u32 = 1024;

const EXTRACTION_PROMPT: &str = r#"Extract data from this receipt image. Return ONLY valid JSON with this structure:
{
    "merchant_name": "string or null",
    "transaction_date": "YYYY-MM-DD or null",
    "subtotal": number or null,
    "tax": number or null,
    "tip": number or null,
    "grand_total": number,
    "payment_method": "string or null",
    "line_items": [
        {"description": "string", "quantity": number, "total_price": number}
    ]
}

If a field is unclear, use null. grand_total is required - estimate from visible totals if needed."#;

impl VisionExtractor for AnthropicClient {
    async fn extract(
        &self,
        image_bytes: &[u8],
        media_type: &str,
    ) -> Result<Extraction, ExtractionError> {
        let content = [
            ContentBlock::Image {
                source: ImageSource::base64(media_type.to_string(), BASE64.encode(image_bytes)),
            },
            ContentBlock::Text {
                text: EXTRACTION_PROMPT.to_string(),
            },
        ];

        let reply = self.complete(&content, EXTRACTION_MAX_TOKENS).await?;
        parse_extraction(&reply)
    }
}
