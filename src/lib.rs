//! Termsync - Custom Terminology and Bulk Translation Workflow
//!
//! Maintains an English-to-target-language dictionary as a JSON snapshot in
//! object storage, exports it as terminology CSVs for Amazon Translate, and
//! runs single or bulk translations that apply the custom terminology.

pub mod aws;
pub mod bulk;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod storage;
pub mod translate;
pub mod workflow;
