use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::aws::{AwsHttp, Credentials};
use crate::bulk::{BulkTranslator, JobHandle};
use crate::cancel::CancelFlag;
use crate::config::{Config, StorageBackend};
use crate::dictionary::{CsvExport, CsvExporter, DictionaryStore, TerminologyImporter};
use crate::error::{Result, TermsyncError};
use crate::storage::{ObjectLocation, ObjectStore, ObjectSummary, StorageFactory};
use crate::translate::{AmazonTranslateClient, BatchJobStatus, TerminologySummary, TextTranslator, TranslationService};

/// Components wired to one storage and one translation client
pub struct Workflow {
    config: Config,
    store: Arc<dyn ObjectStore>,
    service: Arc<dyn TranslationService>,
    cancel: CancelFlag,
}

/// Result of an export followed by an import
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub export: CsvExport,
    pub terminology: TerminologySummary,
}

impl Workflow {
    /// Build the AWS clients described by `config`
    pub fn new(config: Config, cancel: CancelFlag) -> Result<Self> {
        config.validate()?;

        // local-only commands run without AWS credentials
        let credentials = match Credentials::resolve(&config.aws) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                match config.storage.backend {
                    StorageBackend::S3 => warn!("AWS credentials unavailable: {}", e),
                    StorageBackend::Local => debug!("AWS credentials unavailable: {}", e),
                }
                None
            }
        };
        let http = AwsHttp::new(&config.aws, credentials)?;
        let store = StorageFactory::create_store(&config, Some(http.clone()))?;
        let service: Arc<dyn TranslationService> =
            Arc::new(AmazonTranslateClient::new(http, config.aws.translate_endpoint.clone()));

        info!(
            "Using {} storage (bucket {}) and Translate in {}",
            match config.storage.backend {
                StorageBackend::S3 => "S3",
                StorageBackend::Local => "local",
            },
            config.storage.bucket,
            config.aws.region
        );

        Ok(Self::with_clients(config, store, service, cancel))
    }

    /// Wire pre-built clients
    pub fn with_clients(
        config: Config,
        store: Arc<dyn ObjectStore>,
        service: Arc<dyn TranslationService>,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            config,
            store,
            service,
            cancel,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn translator(&self) -> TextTranslator {
        TextTranslator::new(self.service.clone(), &self.config.translate)
    }

    pub fn bulk_translator(&self) -> BulkTranslator {
        BulkTranslator::new(
            self.store.clone(),
            self.translator(),
            &self.config.translate,
            self.cancel.clone(),
        )
    }

    /// Dictionary bound to the configured snapshot key, not yet loaded
    pub fn dictionary(&self) -> DictionaryStore {
        DictionaryStore::new(
            self.store.clone(),
            ObjectLocation::new(&self.config.storage.bucket, &self.config.storage.dictionary_key),
        )
    }

    /// Dictionary loaded from storage
    pub async fn load_dictionary(&self) -> Result<DictionaryStore> {
        let mut dictionary = self.dictionary();
        dictionary.load().await?;
        Ok(dictionary)
    }

    pub fn csv_location(&self) -> ObjectLocation {
        ObjectLocation::new(&self.config.storage.bucket, &self.config.storage.csv_key)
    }

    pub fn exporter(&self) -> CsvExporter {
        CsvExporter::new(
            self.store.clone(),
            self.csv_location(),
            self.config.storage.timestamp_csv_key,
        )
    }

    pub fn importer(&self) -> TerminologyImporter {
        TerminologyImporter::new(
            self.store.clone(),
            self.service.clone(),
            self.config.translate.custom_terminology_name.clone(),
        )
    }

    pub async fn translate_text(&self, text: &str, target_language: Option<&str>) -> Result<String> {
        self.translator().translate(text, target_language).await
    }

    pub async fn translate_bulk(&self, input_uri: &str, output_uri: &str, target_languages: &[String]) -> Result<JobHandle> {
        self.bulk_translator().translate_bulk(input_uri, output_uri, target_languages).await
    }

    pub async fn job_status(&self, job_id: &str) -> Result<BatchJobStatus> {
        self.bulk_translator().job_status(job_id).await
    }

    /// Export the stored dictionary for `target_language`
    pub async fn export_terminology(&self, target_language: &str) -> Result<CsvExport> {
        let dictionary = self.load_dictionary().await?;
        self.exporter().export(dictionary.entries(), target_language).await
    }

    /// Import the CSV at `csv_key` (default: the configured key)
    pub async fn import_terminology(&self, target_language: &str, csv_key: Option<&str>) -> Result<TerminologySummary> {
        let location = match csv_key {
            Some(key) if !key.trim().is_empty() => ObjectLocation::new(&self.config.storage.bucket, key.trim()),
            _ => self.csv_location(),
        };
        self.importer().import(target_language, &location).await
    }

    /// Refresh the service terminology from the stored dictionary
    pub async fn sync_terminology(&self, target_language: &str) -> Result<SyncResult> {
        if self.config.translate.custom_terminology_name.is_none() {
            return Err(TermsyncError::Validation("no custom terminology name configured".to_string()));
        }

        let export = self.export_terminology(target_language).await?;
        let terminology = self.importer().import(target_language, &export.location).await?;
        info!("Terminology '{}' synced from {}", terminology.name, export.location);

        Ok(SyncResult { export, terminology })
    }

    /// Objects in the configured bucket under `prefix`
    pub async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        self.store
            .list_objects(&self.config.storage.bucket, prefix)
            .await
            .map_err(|e| TermsyncError::operation("list objects", e))
    }
}
