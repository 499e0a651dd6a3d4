// Bulk translation
//
// Two strategies, chosen once per call:
// - managed batch job, when a data access role is configured
// - manual fallback: download, translate item by item, upload

pub mod parse;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

pub use parse::{extract_text, parse_items, translatable_units, TranslatableUnit};

use crate::cancel::CancelFlag;
use crate::config::TranslateConfig;
use crate::error::{Result, TermsyncError};
use crate::storage::{ObjectLocation, ObjectStore, CONTENT_TYPE_JSON};
use crate::translate::{BatchJobRequest, BatchJobStatus, TextTranslator, SOURCE_LANGUAGE};
use std::sync::Arc;

/// Handle string returned when the manual path has finished synchronously
pub const MANUAL_COMPLETION_MARKER: &str = "manual-sync-complete";

/// Output record field holding the source text
const ORIGINAL_FIELD: &str = "original";

/// What a bulk request produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobHandle {
    /// A managed batch job was submitted; poll it by id
    Submitted(String),
    /// The manual fallback ran to completion
    Completed,
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobHandle::Submitted(job_id) => write!(f, "{}", job_id),
            JobHandle::Completed => write!(f, "{}", MANUAL_COMPLETION_MARKER),
        }
    }
}

/// One output record: the original text and a result (or `null`) per language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkResultRecord {
    pub original: String,
    pub translations: Vec<(String, Option<String>)>,
}

impl BulkResultRecord {
    pub fn translation(&self, language: &str) -> Option<&str> {
        self.translations
            .iter()
            .find(|(lang, _)| lang == language)
            .and_then(|(_, text)| text.as_deref())
    }
}

impl Serialize for BulkResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.translations.len() + 1))?;
        map.serialize_entry(ORIGINAL_FIELD, &self.original)?;
        for (language, text) in &self.translations {
            map.serialize_entry(language, text)?;
        }
        map.end()
    }
}

/// Counts from a manual run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSummary {
    pub units: usize,
    pub skipped: usize,
    pub failed_translations: usize,
}

pub struct BulkTranslator {
    store: Arc<dyn ObjectStore>,
    translator: TextTranslator,
    service_role_arn: Option<String>,
    batch_content_type: String,
    cancel: CancelFlag,
}

impl BulkTranslator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        translator: TextTranslator,
        config: &TranslateConfig,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            store,
            translator,
            service_role_arn: config.service_role_arn.clone(),
            batch_content_type: config.batch_content_type.clone(),
            cancel,
        }
    }

    /// Translate everything at `input_uri` into `target_languages`, writing to
    /// `output_uri`
    pub async fn translate_bulk(
        &self,
        input_uri: &str,
        output_uri: &str,
        target_languages: &[String],
    ) -> Result<JobHandle> {
        let input = ObjectLocation::parse_prefix(input_uri)?;
        let output = ObjectLocation::parse_prefix(output_uri)?;
        let languages = clean_languages(target_languages)?;

        if self.service_role_arn.is_none() {
            // the manual loop reads and writes single objects
            for location in [&input, &output] {
                if location.is_bucket_root() {
                    return Err(TermsyncError::Validation(format!(
                        "{} names a whole bucket; the item-by-item path needs an object key",
                        location
                    )));
                }
            }
        }

        match &self.service_role_arn {
            Some(role) => {
                let job_id = self
                    .submit_batch_job(&input, &output, &languages, role)
                    .await
                    .map_err(|e| TermsyncError::operation("start batch translation", e))?;
                Ok(JobHandle::Submitted(job_id))
            }
            None => {
                self.run_manual(&input, &output, &languages)
                    .await
                    .map_err(|e| TermsyncError::operation("bulk translation", e))?;
                Ok(JobHandle::Completed)
            }
        }
    }

    /// Current status of a submitted batch job
    pub async fn job_status(&self, job_id: &str) -> Result<BatchJobStatus> {
        if job_id.trim().is_empty() {
            return Err(TermsyncError::Validation("job id must not be empty".to_string()));
        }
        self.translator
            .service()
            .describe_batch_job(job_id.trim())
            .await
            .map_err(|e| TermsyncError::operation("describe batch job", e))
    }

    async fn submit_batch_job(
        &self,
        input: &ObjectLocation,
        output: &ObjectLocation,
        languages: &[String],
        role: &str,
    ) -> Result<String> {
        let request = BatchJobRequest {
            job_name: format!("termsync-{}", Utc::now().format("%Y%m%d%H%M%S")),
            input_uri: input.to_string(),
            input_content_type: self.batch_content_type.clone(),
            output_uri: output.to_string(),
            data_access_role_arn: role.to_string(),
            source_language: SOURCE_LANGUAGE.to_string(),
            target_languages: languages.to_vec(),
            terminology_names: self.translator.terminology_name().map(String::from).into_iter().collect(),
            client_token: Uuid::new_v4().to_string(),
        };

        info!(
            "Submitting batch job {} for {} -> {} ({})",
            request.job_name,
            input,
            output,
            languages.join(",")
        );
        self.translator.service().start_batch_job(&request).await
    }

    /// Manual fallback: every unit x language, one call at a time
    async fn run_manual(
        &self,
        input: &ObjectLocation,
        output: &ObjectLocation,
        languages: &[String],
    ) -> Result<BulkSummary> {
        info!("Running manual bulk translation of {} into {}", input, languages.join(","));

        let bytes = self.store.get_object(input).await?;
        let content = String::from_utf8(bytes)
            .map_err(|e| TermsyncError::Storage(format!("{} is not valid UTF-8: {}", input, e)))?;

        let (units, skipped) = translatable_units(&content);
        info!("Parsed {} translatable items ({} skipped)", units.len(), skipped);

        let pb = ProgressBar::new((units.len() * languages.len()) as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut summary = BulkSummary {
            units: units.len(),
            skipped,
            failed_translations: 0,
        };
        let mut records = Vec::with_capacity(units.len());

        for (idx, unit) in units.iter().enumerate() {
            self.cancel.check()?;

            let mut translations = Vec::with_capacity(languages.len());
            for language in languages {
                let result = match self.translator.translate(&unit.text, Some(language.as_str())).await {
                    Ok(text) => Some(text),
                    Err(e) => {
                        warn!("Item {} failed for {}: {}", idx + 1, language, e.root_cause());
                        summary.failed_translations += 1;
                        None
                    }
                };
                translations.push((language.clone(), result));
                pb.inc(1);
            }

            records.push(BulkResultRecord {
                original: unit.text.clone(),
                translations,
            });
        }
        pb.finish_and_clear();

        let body = serde_json::to_vec_pretty(&records)?;
        self.store.put_object(output, body, CONTENT_TYPE_JSON).await?;

        info!(
            "Manual bulk translation finished: {} items, {} skipped, {} failed translations -> {}",
            summary.units, summary.skipped, summary.failed_translations, output
        );
        Ok(summary)
    }
}

/// Trimmed, non-empty target languages in request order, de-duplicated
/// ignoring case. The first spelling of a tag wins.
fn clean_languages(target_languages: &[String]) -> Result<Vec<String>> {
    let mut languages: Vec<String> = Vec::new();
    for language in target_languages.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        if language.eq_ignore_ascii_case(ORIGINAL_FIELD) {
            return Err(TermsyncError::Validation(format!(
                "'{}' is reserved for the source text and cannot be a target language",
                language
            )));
        }
        if !languages.iter().any(|seen| seen.eq_ignore_ascii_case(language)) {
            languages.push(language.to_string());
        }
    }

    if languages.is_empty() {
        return Err(TermsyncError::Validation("at least one target language is required".to_string()));
    }
    Ok(languages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LocalStore, MockObjectStore};
    use crate::translate::{MockTranslationService, TranslateTextRequest};
    use serde_json::{json, Value};

    fn langs(list: &[&str]) -> Vec<String> {
        list.iter().map(|l| l.to_string()).collect()
    }

    fn manual_config() -> TranslateConfig {
        TranslateConfig::default()
    }

    fn batch_config() -> TranslateConfig {
        TranslateConfig {
            service_role_arn: Some("arn:aws:iam::123456789012:role/translate".to_string()),
            custom_terminology_name: Some("product-terms".to_string()),
            ..TranslateConfig::default()
        }
    }

    /// fr succeeds, everything else fails
    fn french_only_service() -> MockTranslationService {
        let mut service = MockTranslationService::new();
        service
            .expect_translate_text()
            .returning(|req: &TranslateTextRequest| match req.target_language.as_str() {
                "fr" if req.text == "good morning" => Ok("bonjour".to_string()),
                "fr" => Ok(format!("fr:{}", req.text)),
                _ => Err(TermsyncError::Service("unsupported".to_string())),
            });
        service
    }

    async fn run_manual_with(
        input: &str,
        languages: &[&str],
        service: MockTranslationService,
    ) -> (Result<JobHandle>, Option<String>) {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(LocalStore::new(dir.path()));
        store
            .put_object(&ObjectLocation::new("in", "input.json"), input.as_bytes().to_vec(), "application/json")
            .await
            .unwrap();

        let config = manual_config();
        let translator = TextTranslator::new(Arc::new(service), &config);
        let bulk = BulkTranslator::new(store.clone(), translator, &config, CancelFlag::new());

        let result = bulk
            .translate_bulk("s3://in/input.json", "s3://out/result.json", &langs(languages))
            .await;
        let output = store
            .get_object(&ObjectLocation::new("out", "result.json"))
            .await
            .ok()
            .map(|bytes| String::from_utf8(bytes).unwrap());
        (result, output)
    }

    fn parsed(output: Option<String>) -> Value {
        serde_json::from_str(&output.expect("output was not written")).unwrap()
    }

    #[tokio::test]
    async fn test_manual_partial_failure_records_null() {
        let (result, output) = run_manual_with(r#"["good morning"]"#, &["fr", "de"], french_only_service()).await;

        assert_eq!(result.unwrap(), JobHandle::Completed);
        assert_eq!(parsed(output), json!([{"original": "good morning", "fr": "bonjour", "de": null}]));
    }

    #[tokio::test]
    async fn test_manual_output_keeps_language_order() {
        let (_, output) = run_manual_with(r#"["good morning"]"#, &["de", "fr"], french_only_service()).await;
        let text = output.unwrap();

        assert!(text.find("\"original\"").unwrap() < text.find("\"de\"").unwrap());
        assert!(text.find("\"de\"").unwrap() < text.find("\"fr\"").unwrap());
    }

    #[tokio::test]
    async fn test_manual_newline_input() {
        let (result, output) = run_manual_with("a\n\nb\n", &["fr"], french_only_service()).await;

        assert!(result.is_ok());
        assert_eq!(
            parsed(output),
            json!([{"original": "a", "fr": "fr:a"}, {"original": "b", "fr": "fr:b"}])
        );
    }

    #[tokio::test]
    async fn test_manual_empty_translations_falls_back_to_lines() {
        let input = r#"{ "translations": [] }"#;
        let (result, output) = run_manual_with(input, &["fr"], french_only_service()).await;

        assert!(result.is_ok());
        let records = parsed(output);
        assert_eq!(records.as_array().unwrap().len(), 1);
        assert_eq!(records[0]["original"], json!(input));
    }

    #[tokio::test]
    async fn test_manual_skips_items_without_text() {
        let input = r#"{"translations": [{"Text": "good morning"}, {"id": 3}, {"source": "cat"}]}"#;
        let (_, output) = run_manual_with(input, &["fr"], french_only_service()).await;

        assert_eq!(
            parsed(output),
            json!([{"original": "good morning", "fr": "bonjour"}, {"original": "cat", "fr": "fr:cat"}])
        );
    }

    #[tokio::test]
    async fn test_manual_all_failures_still_completes() {
        let (result, output) = run_manual_with(r#"["a", "b"]"#, &["de", "ja"], french_only_service()).await;

        assert_eq!(result.unwrap(), JobHandle::Completed);
        assert_eq!(
            parsed(output),
            json!([{"original": "a", "de": null, "ja": null}, {"original": "b", "de": null, "ja": null}])
        );
    }

    #[tokio::test]
    async fn test_manual_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(LocalStore::new(dir.path()));
        let config = manual_config();
        let translator = TextTranslator::new(Arc::new(MockTranslationService::new()), &config);
        let bulk = BulkTranslator::new(store, translator, &config, CancelFlag::new());

        let err = bulk
            .translate_bulk("s3://in/missing.json", "s3://out/result.json", &langs(&["fr"]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "bulk translation failed");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_manual_upload_failure_fails() {
        let mut store = MockObjectStore::new();
        store
            .expect_get_object()
            .returning(|_| Ok(b"hello".to_vec()));
        store
            .expect_put_object()
            .times(1)
            .returning(|_, _, _| Err(TermsyncError::Storage("denied".to_string())));

        let config = manual_config();
        let translator = TextTranslator::new(Arc::new(french_only_service()), &config);
        let bulk = BulkTranslator::new(Arc::new(store), translator, &config, CancelFlag::new());

        let err = bulk
            .translate_bulk("s3://in/input.txt", "s3://out/result.json", &langs(&["fr"]))
            .await
            .unwrap_err();

        assert!(matches!(err.root_cause(), TermsyncError::Storage(_)));
    }

    #[tokio::test]
    async fn test_manual_cancelled_before_upload() {
        let mut store = MockObjectStore::new();
        store
            .expect_get_object()
            .returning(|_| Ok(b"a\nb".to_vec()));
        store.expect_put_object().times(0);

        let mut service = MockTranslationService::new();
        service.expect_translate_text().times(0);

        let config = manual_config();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let translator = TextTranslator::new(Arc::new(service), &config);
        let bulk = BulkTranslator::new(Arc::new(store), translator, &config, cancel);

        let result = bulk
            .translate_bulk("s3://in/input.txt", "s3://out/result.json", &langs(&["fr"]))
            .await;

        assert!(matches!(result, Err(TermsyncError::Cancelled)));
    }

    #[tokio::test]
    async fn test_batch_branch_submits_job() {
        let mut service = MockTranslationService::new();
        service.expect_translate_text().times(0);
        service
            .expect_start_batch_job()
            .withf(|req: &BatchJobRequest| {
                req.input_uri == "s3://in/docs/"
                    && req.output_uri == "s3://out/docs/"
                    && req.source_language == "en"
                    && req.target_languages == vec!["fr".to_string(), "de".to_string()]
                    && req.terminology_names == vec!["product-terms".to_string()]
                    && req.input_content_type == "text/plain"
                    && !req.client_token.is_empty()
            })
            .times(1)
            .returning(|_| Ok("job-123".to_string()));

        let mut store = MockObjectStore::new();
        store.expect_get_object().times(0);
        store.expect_put_object().times(0);

        let config = batch_config();
        let translator = TextTranslator::new(Arc::new(service), &config);
        let bulk = BulkTranslator::new(Arc::new(store), translator, &config, CancelFlag::new());

        let handle = bulk
            .translate_bulk("s3://in/docs/", "s3://out/docs/", &langs(&["fr", " de", "fr"]))
            .await
            .unwrap();

        assert_eq!(handle, JobHandle::Submitted("job-123".to_string()));
        assert_eq!(handle.to_string(), "job-123");
    }

    #[tokio::test]
    async fn test_batch_submission_failure_is_wrapped() {
        let mut service = MockTranslationService::new();
        service
            .expect_start_batch_job()
            .returning(|_| Err(TermsyncError::Service("AccessDenied".to_string())));

        let config = batch_config();
        let translator = TextTranslator::new(Arc::new(service), &config);
        let bulk = BulkTranslator::new(Arc::new(MockObjectStore::new()), translator, &config, CancelFlag::new());

        let err = bulk
            .translate_bulk("s3://in/docs/", "s3://out/docs/", &langs(&["fr"]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "start batch translation failed");
        assert!(matches!(err.root_cause(), TermsyncError::Service(_)));
    }

    #[tokio::test]
    async fn test_validation_happens_before_io() {
        let mut store = MockObjectStore::new();
        store.expect_get_object().times(0);
        let config = manual_config();
        let translator = TextTranslator::new(Arc::new(MockTranslationService::new()), &config);
        let bulk = BulkTranslator::new(Arc::new(store), translator, &config, CancelFlag::new());

        let bad_uri = bulk.translate_bulk("in/input.json", "s3://out/r.json", &langs(&["fr"])).await;
        assert!(matches!(bad_uri, Err(TermsyncError::Validation(_))));

        let no_langs = bulk.translate_bulk("s3://in/i.json", "s3://out/r.json", &langs(&[" "])).await;
        assert!(matches!(no_langs, Err(TermsyncError::Validation(_))));
    }

    #[tokio::test]
    async fn test_manual_invalid_utf8_input_is_storage_error() {
        let mut store = MockObjectStore::new();
        store
            .expect_get_object()
            .times(1)
            .returning(|_| Ok(vec![0xff, 0xfe]));
        store.expect_put_object().times(0);

        let mut service = MockTranslationService::new();
        service.expect_translate_text().times(0);

        let config = manual_config();
        let translator = TextTranslator::new(Arc::new(service), &config);
        let bulk = BulkTranslator::new(Arc::new(store), translator, &config, CancelFlag::new());

        let err = bulk
            .translate_bulk("s3://in/input.txt", "s3://out/result.json", &langs(&["fr"]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "bulk translation failed");
        assert!(matches!(err.root_cause(), TermsyncError::Storage(_)));
    }

    #[tokio::test]
    async fn test_batch_branch_accepts_bucket_root() {
        let mut service = MockTranslationService::new();
        service
            .expect_start_batch_job()
            .withf(|req: &BatchJobRequest| req.input_uri == "s3://in/" && req.output_uri == "s3://out/")
            .times(1)
            .returning(|_| Ok("job-root".to_string()));

        let config = batch_config();
        let translator = TextTranslator::new(Arc::new(service), &config);
        let bulk = BulkTranslator::new(Arc::new(MockObjectStore::new()), translator, &config, CancelFlag::new());

        let handle = bulk
            .translate_bulk("s3://in/", "s3://out/", &langs(&["fr"]))
            .await
            .unwrap();
        assert_eq!(handle, JobHandle::Submitted("job-root".to_string()));
    }

    #[tokio::test]
    async fn test_manual_branch_rejects_bucket_root() {
        let mut store = MockObjectStore::new();
        store.expect_get_object().times(0);
        store.expect_put_object().times(0);

        let config = manual_config();
        let translator = TextTranslator::new(Arc::new(MockTranslationService::new()), &config);
        let bulk = BulkTranslator::new(Arc::new(store), translator, &config, CancelFlag::new());

        let input_root = bulk.translate_bulk("s3://in/", "s3://out/r.json", &langs(&["fr"])).await;
        assert!(matches!(input_root, Err(TermsyncError::Validation(_))));

        let output_root = bulk.translate_bulk("s3://in/i.json", "s3://out/", &langs(&["fr"])).await;
        assert!(matches!(output_root, Err(TermsyncError::Validation(_))));
    }

    #[test]
    fn test_clean_languages_ignores_case_for_duplicates() {
        let languages = clean_languages(&langs(&["fr", "de", "FR", " De ", "ja"])).unwrap();
        assert_eq!(languages, vec!["fr", "de", "ja"]);
    }

    #[test]
    fn test_clean_languages_rejects_original_tag() {
        for tag in ["original", " Original "] {
            let result = clean_languages(&langs(&["fr", tag]));
            assert!(matches!(result, Err(TermsyncError::Validation(_))), "{} accepted", tag);
        }
    }

    #[test]
    fn test_completed_handle_is_sentinel() {
        assert_eq!(JobHandle::Completed.to_string(), MANUAL_COMPLETION_MARKER);
    }

    #[test]
    fn test_record_lookup() {
        let record = BulkResultRecord {
            original: "good morning".to_string(),
            translations: vec![("fr".to_string(), Some("bonjour".to_string())), ("de".to_string(), None)],
        };
        assert_eq!(record.translation("fr"), Some("bonjour"));
        assert_eq!(record.translation("de"), None);
    }
}
