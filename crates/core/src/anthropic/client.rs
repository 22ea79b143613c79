//! HTTP client for the Anthropic Messages API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Errors from the upstream model API.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Client construction or transport failure (includes timeouts).
    #[error("model request failed: {0}")]
    Transport(String),

    /// Non-success response from the API.
    #[error("model API returned status {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The response carried no text content.
    #[error("model response contained no text content")]
    EmptyResponse,
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// A content block in a user message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text block.
    Text {
        /// The text content.
        text: String,
    },
    /// Base64-encoded image block.
    Image {
        /// Image source descriptor.
        source: ImageSource,
    },
}

/// Base64 image source for an image content block.
#[derive(Debug, Clone, Serialize)]
pub struct ImageSource {
    /// Source type; always `base64`.
    #[serde(rename = "type")]
    pub source_type: &'static str,
    /// MIME type of the image.
    pub media_type: String,
    /// Base64-encoded image data.
    pub data: String,
}

impl ImageSource {
    /// Creates a base64 image source.
    #[must_use]
    pub const fn base64(media_type: String, data: String) -> Self {
        Self {
            source_type: "base64",
            media_type,
            data,
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a [ContentBlock],
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Client for the Anthropic Messages API.
///
/// Cheap to clone; the inner reqwest client is reference-counted.
#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[hidden]")
            .finish()
    }
}

impl AnthropicClient {
    /// Creates a new client.
    ///
    /// The timeout bounds a single round trip; there is no retry.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Transport` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Sends a single user message and returns the first text block of the reply.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or a
    /// reply without text content.
    pub async fn complete(
        &self,
        content: &[ContentBlock],
        max_tokens: u32,
    ) -> Result<String, ModelError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: vec![Message {
                role: "user",
                content,
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or(ModelError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_block_serialization() {
        let block = ContentBlock::Text {
            text: "hello".to_string(),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "hello");

        let block = ContentBlock::Image {
            source: ImageSource::base64("image/png".to_string(), "QUJD".to_string()),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["source"]["type"], "base64");
        assert_eq!(json["source"]["media_type"], "image/png");
    }

    #[test]
    fn test_response_parsing_takes_first_text_block() {
        let raw = r#"{"content":[{"type":"text","text":"{\"a\":1}"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        let text = parsed.content.into_iter().find_map(|b| b.text);
        assert_eq!(text.as_deref(), Some("{\"a\":1}"));
    }
}
