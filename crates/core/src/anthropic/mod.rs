//! Client for the Anthropic Messages API.
//!
//! One client serves both model calls the system makes: vision extraction
//! from receipt images and text classification of merchants. The trait
//! implementations live next to their traits (`extraction`, `categorize`);
//! this module only owns the HTTP plumbing.

mod client;

pub use client::{AnthropicClient, ContentBlock, ImageSource, ModelError};
