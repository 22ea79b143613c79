//! Core business logic for Recibo.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `extraction` - Receipt image extraction via an external vision model
//! - `categorize` - Merchant-rule and classifier-based categorization
//! - `budget` - Date-ranged budget intervals and overlap repair
//! - `dashboard` - Monthly spending aggregation against budget limits
//! - `processor` - The upload pipeline composing extraction + categorization
//! - `storage` - Receipt image blob storage
//! - `anthropic` - Shared client for the upstream model API

pub mod anthropic;
pub mod budget;
pub mod categorize;
pub mod dashboard;
pub mod extraction;
pub mod processor;
pub mod storage;
