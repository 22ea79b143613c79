//! The receipt upload pipeline: extraction followed by categorization.
//!
//! Both stages must succeed before anything is persisted; a failure in
//! either fails the whole upload.

mod service;

pub use service::{CategoryOption, ProcessError, ProcessedReceipt, ReceiptProcessor};
