use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateTextRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    pub terminology_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchJobRequest {
    pub job_name: String,
    pub input_uri: String,
    pub input_content_type: String,
    pub output_uri: String,
    pub data_access_role_arn: String,
    pub source_language: String,
    pub target_languages: Vec<String>,
    pub terminology_names: Vec<String>,
    /// Idempotency token for the submission
    pub client_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MergeStrategy {
    /// Replace the whole terminology with the imported content
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TerminologyFormat {
    Csv,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTerminologyRequest {
    pub name: String,
    pub merge_strategy: MergeStrategy,
    pub description: String,
    pub format: TerminologyFormat,
    pub data: Vec<u8>,
}

/// Properties reported back after a terminology import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminologySummary {
    pub name: String,
    pub arn: Option<String>,
    pub term_count: Option<u64>,
    pub target_languages: Vec<String>,
}

/// Status of a managed batch job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchJobStatus {
    pub job_id: String,
    pub job_name: Option<String>,
    pub status: String,
    pub message: Option<String>,
    pub translated_documents: Option<u64>,
    pub failed_documents: Option<u64>,
}

/// Main trait for translation service operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Translate one string
    async fn translate_text(&self, request: &TranslateTextRequest) -> Result<String>;

    /// Submit a managed batch job and return its id without waiting
    async fn start_batch_job(&self, request: &BatchJobRequest) -> Result<String>;

    /// Create or replace a named terminology
    async fn import_terminology(&self, request: &ImportTerminologyRequest) -> Result<TerminologySummary>;

    /// Current state of a batch job
    async fn describe_batch_job(&self, job_id: &str) -> Result<BatchJobStatus>;
}
