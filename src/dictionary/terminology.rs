use std::sync::Arc;
use tracing::info;

use crate::error::{Result, TermsyncError};
use crate::storage::{ObjectLocation, ObjectStore};
use crate::translate::{
    ImportTerminologyRequest, MergeStrategy, TerminologyFormat, TerminologySummary,
    TranslationService, SOURCE_LANGUAGE,
};
use super::normalize;

/// Imports an exported CSV as the named custom terminology
pub struct TerminologyImporter {
    store: Arc<dyn ObjectStore>,
    service: Arc<dyn TranslationService>,
    terminology_name: Option<String>,
}

impl TerminologyImporter {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        service: Arc<dyn TranslationService>,
        terminology_name: Option<String>,
    ) -> Self {
        Self {
            store,
            service,
            terminology_name,
        }
    }

    /// Replace the terminology with the CSV at `csv_location`.
    ///
    /// The CSV must already exist: unlike a dictionary load, a missing object
    /// here fails the import.
    pub async fn import(&self, target_language: &str, csv_location: &ObjectLocation) -> Result<TerminologySummary> {
        let name = self
            .terminology_name
            .as_deref()
            .ok_or_else(|| TermsyncError::Validation("no custom terminology name configured".to_string()))?;
        let target = normalize(target_language);
        if target.is_empty() {
            return Err(TermsyncError::Validation("target language must not be empty".to_string()));
        }

        let data = self.store.get_object(csv_location).await.map_err(|e| {
            let cause = match e {
                TermsyncError::NotFound(what) => {
                    TermsyncError::Storage(format!("Terminology CSV not found: {}", what))
                }
                other => other,
            };
            TermsyncError::operation("import terminology", cause)
        })?;

        let request = ImportTerminologyRequest {
            name: name.to_string(),
            merge_strategy: MergeStrategy::Overwrite,
            description: format!("Custom terminology for {} -> {}", SOURCE_LANGUAGE, target),
            format: TerminologyFormat::Csv,
            data,
        };

        let summary = self
            .service
            .import_terminology(&request)
            .await
            .map_err(|e| TermsyncError::operation("import terminology", e))?;

        info!(
            "Imported terminology '{}' from {} ({} terms)",
            summary.name,
            csv_location,
            summary.term_count.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string())
        );
        Ok(summary)
    }
}
