use async_trait::async_trait;
use base64::Engine;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aws::{AwsHttp, AwsRequest};
use crate::error::{Result, TermsyncError};
use super::service::{
    BatchJobRequest, BatchJobStatus, ImportTerminologyRequest, TerminologySummary,
    TranslateTextRequest, TranslationService,
};

const SERVICE: &str = "translate";
const TARGET_PREFIX: &str = "AWSShineFrontendService_20170701";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

// Wire types for the AWS JSON 1.1 protocol

fn no_names(names: &&[String]) -> bool {
    names.is_empty()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TranslateTextInput<'a> {
    text: &'a str,
    source_language_code: &'a str,
    target_language_code: &'a str,
    #[serde(skip_serializing_if = "no_names")]
    terminology_names: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TranslateTextOutput {
    translated_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct InputDataConfig<'a> {
    #[serde(rename = "S3Uri")]
    s3_uri: &'a str,
    content_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct OutputDataConfig<'a> {
    #[serde(rename = "S3Uri")]
    s3_uri: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StartJobInput<'a> {
    job_name: &'a str,
    input_data_config: InputDataConfig<'a>,
    output_data_config: OutputDataConfig<'a>,
    data_access_role_arn: &'a str,
    source_language_code: &'a str,
    target_language_codes: &'a [String],
    #[serde(skip_serializing_if = "no_names")]
    terminology_names: &'a [String],
    client_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StartJobOutput {
    job_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TerminologyData<'a> {
    file: String,
    format: &'a super::service::TerminologyFormat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ImportTerminologyInput<'a> {
    name: &'a str,
    merge_strategy: &'a super::service::MergeStrategy,
    description: &'a str,
    terminology_data: TerminologyData<'a>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ImportTerminologyOutput {
    terminology_properties: Option<TerminologyProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TerminologyProperties {
    name: Option<String>,
    arn: Option<String>,
    term_count: Option<u64>,
    #[serde(default)]
    target_language_codes: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeJobInput<'a> {
    job_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeJobOutput {
    text_translation_job_properties: JobProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JobProperties {
    job_id: String,
    job_name: Option<String>,
    job_status: String,
    message: Option<String>,
    job_details: Option<JobDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JobDetails {
    translated_documents_count: Option<u64>,
    documents_with_errors_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ServiceFault {
    #[serde(rename = "__type")]
    kind: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Amazon Translate client
pub struct AmazonTranslateClient {
    http: AwsHttp,
    endpoint: String,
}

impl AmazonTranslateClient {
    pub fn new(http: AwsHttp, endpoint: Option<String>) -> Self {
        let endpoint = endpoint
            .unwrap_or_else(|| format!("https://translate.{}.amazonaws.com", http.region()));
        Self { http, endpoint }
    }

    /// Invoke one API action with a JSON body
    async fn call<I: Serialize, O: DeserializeOwned>(&self, action: &str, input: &I) -> Result<O> {
        let body = serde_json::to_vec(input)?;
        let request = AwsRequest::new(Method::POST, self.endpoint.clone(), "/")
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-target", &format!("{}.{}", TARGET_PREFIX, action))
            .body(body);

        debug!("Calling Translate {}", action);
        let response = self.http.send(SERVICE, request).await
            .map_err(|e| TermsyncError::Service(format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        let text = response.text().await
            .map_err(|e| TermsyncError::Service(format!("Failed to read {} response: {}", action, e)))?;

        if !status.is_success() {
            return Err(TermsyncError::Service(format!(
                "{} failed with HTTP {}: {}", action, status, describe_fault(&text)
            )));
        }

        serde_json::from_str(&text)
            .map_err(|e| TermsyncError::Service(format!("Failed to parse {} response: {}", action, e)))
    }
}

/// Human-readable summary of an AWS JSON error body
fn describe_fault(body: &str) -> String {
    match serde_json::from_str::<ServiceFault>(body) {
        Ok(fault) => {
            let kind = fault
                .kind
                .map(|k| k.rsplit('#').next().unwrap_or_default().to_string())
                .unwrap_or_else(|| "UnknownError".to_string());
            match fault.message {
                Some(message) => format!("{}: {}", kind, message),
                None => kind,
            }
        }
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl TranslationService for AmazonTranslateClient {
    async fn translate_text(&self, request: &TranslateTextRequest) -> Result<String> {
        let input = TranslateTextInput {
            text: &request.text,
            source_language_code: &request.source_language,
            target_language_code: &request.target_language,
            terminology_names: &request.terminology_names,
        };
        let output: TranslateTextOutput = self.call("TranslateText", &input).await?;
        Ok(output.translated_text)
    }

    async fn start_batch_job(&self, request: &BatchJobRequest) -> Result<String> {
        let input = StartJobInput {
            job_name: &request.job_name,
            input_data_config: InputDataConfig {
                s3_uri: &request.input_uri,
                content_type: &request.input_content_type,
            },
            output_data_config: OutputDataConfig {
                s3_uri: &request.output_uri,
            },
            data_access_role_arn: &request.data_access_role_arn,
            source_language_code: &request.source_language,
            target_language_codes: &request.target_languages,
            terminology_names: &request.terminology_names,
            client_token: &request.client_token,
        };
        let output: StartJobOutput = self.call("StartTextTranslationJob", &input).await?;
        info!("Started batch translation job {}", output.job_id);
        Ok(output.job_id)
    }

    async fn import_terminology(&self, request: &ImportTerminologyRequest) -> Result<TerminologySummary> {
        let input = ImportTerminologyInput {
            name: &request.name,
            merge_strategy: &request.merge_strategy,
            description: &request.description,
            terminology_data: TerminologyData {
                file: base64::engine::general_purpose::STANDARD.encode(&request.data),
                format: &request.format,
            },
        };
        let output: ImportTerminologyOutput = self.call("ImportTerminology", &input).await?;

        let summary = match output.terminology_properties {
            Some(props) => TerminologySummary {
                name: props.name.unwrap_or_else(|| request.name.clone()),
                arn: props.arn,
                term_count: props.term_count,
                target_languages: props.target_language_codes,
            },
            None => TerminologySummary {
                name: request.name.clone(),
                ..Default::default()
            },
        };
        Ok(summary)
    }

    async fn describe_batch_job(&self, job_id: &str) -> Result<BatchJobStatus> {
        let output: DescribeJobOutput = self
            .call("DescribeTextTranslationJob", &DescribeJobInput { job_id })
            .await?;
        let props = output.text_translation_job_properties;
        let details = props.job_details;

        Ok(BatchJobStatus {
            job_id: props.job_id,
            job_name: props.job_name,
            status: props.job_status,
            message: props.message,
            translated_documents: details.as_ref().and_then(|d| d.translated_documents_count),
            failed_documents: details.as_ref().and_then(|d| d.documents_with_errors_count),
        })
    }
}
