// Machine translation
//
// - service: the TranslationService trait and its request/response types
// - amazon: Amazon Translate client over the AWS JSON protocol
// - text: single-string translation with the configured terminology

pub mod amazon;
pub mod service;
pub mod text;

pub use amazon::AmazonTranslateClient;
pub use service::*;
pub use text::TextTranslator;

/// Source language of all translated content
pub const SOURCE_LANGUAGE: &str = "en";
