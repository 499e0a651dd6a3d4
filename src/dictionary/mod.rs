// Custom terminology dictionary
//
// - DictionaryStore: in-memory entry list synced with a JSON snapshot in storage
// - CsvExporter: per-language two-column CSV for terminology import
// - TerminologyImporter: pushes the CSV into the translation service

pub mod export;
pub mod terminology;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub use export::{CsvExport, CsvExporter};
pub use terminology::TerminologyImporter;

use crate::cancel::CancelFlag;
use crate::error::{Result, TermsyncError};
use crate::storage::{ObjectLocation, ObjectStore, CONTENT_TYPE_JSON};
use crate::translate::TextTranslator;

/// One terminology override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub source: String,
    /// Blank means the default target language
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub translation: String,
}

impl DictionaryEntry {
    pub fn new(source: impl Into<String>, language: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            language: language.into(),
            translation: translation.into(),
        }
    }

    /// Identity comparison: source and language, trimmed and case-insensitive
    pub fn matches(&self, source: &str, language: &str) -> bool {
        normalize(&self.source) == normalize(source) && normalize(&self.language) == normalize(language)
    }

    pub fn needs_translation(&self) -> bool {
        self.translation.trim().is_empty() && !self.source.trim().is_empty()
    }
}

/// Trimmed, lowercased form used for keys and language tags
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Outcome of [`DictionaryStore::add_or_update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Added,
    Updated,
}

/// Entry that could not be auto-translated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoFillFailure {
    pub source: String,
    pub language: String,
    pub error: String,
}

/// Result of an auto-fill pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoFillReport {
    pub translated: usize,
    pub failures: Vec<AutoFillFailure>,
}

/// In-memory dictionary backed by a JSON snapshot object
pub struct DictionaryStore {
    store: Arc<dyn ObjectStore>,
    location: ObjectLocation,
    entries: Vec<DictionaryEntry>,
}

impl DictionaryStore {
    pub fn new(store: Arc<dyn ObjectStore>, location: ObjectLocation) -> Self {
        Self {
            store,
            location,
            entries: Vec::new(),
        }
    }

    pub fn location(&self) -> &ObjectLocation {
        &self.location
    }

    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose language tag matches `language` after normalization
    pub fn entries_for<'a>(&'a self, language: &str) -> impl Iterator<Item = &'a DictionaryEntry> + 'a {
        let language = normalize(language);
        self.entries
            .iter()
            .filter(move |e| normalize(&e.language) == language)
    }

    /// Replace the in-memory list with the stored snapshot.
    ///
    /// A missing snapshot loads as an empty dictionary. On any other failure
    /// the current entries are kept.
    pub async fn load(&mut self) -> Result<usize> {
        let bytes = match self.store.get_object(&self.location).await {
            Ok(bytes) => bytes,
            Err(TermsyncError::NotFound(_)) => {
                info!("No dictionary snapshot at {}, starting empty", self.location);
                self.entries.clear();
                return Ok(0);
            }
            Err(e) => return Err(TermsyncError::operation("load dictionary", e)),
        };

        let entries: Vec<DictionaryEntry> = serde_json::from_slice(&bytes).map_err(|e| {
            TermsyncError::operation(
                "load dictionary",
                TermsyncError::Storage(format!("Invalid dictionary snapshot at {}: {}", self.location, e)),
            )
        })?;

        self.entries = entries;
        info!("Loaded {} dictionary entries from {}", self.entries.len(), self.location);
        Ok(self.entries.len())
    }

    /// Set the translation for (source, language), appending a new entry if
    /// none matches
    pub fn add_or_update(&mut self, source: &str, language: &str, translation: &str) -> Result<Upsert> {
        if source.trim().is_empty() {
            return Err(TermsyncError::Validation("source must not be empty".to_string()));
        }
        if language.trim().is_empty() {
            return Err(TermsyncError::Validation("language must not be empty".to_string()));
        }

        match self.entries.iter_mut().find(|e| e.matches(source, language)) {
            Some(entry) => {
                entry.translation = translation.to_string();
                Ok(Upsert::Updated)
            }
            None => {
                self.entries.push(DictionaryEntry::new(source, language, translation));
                Ok(Upsert::Added)
            }
        }
    }

    /// Remove every entry for (source, language). Returns whether any was removed.
    pub fn delete(&mut self, source: &str, language: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| !e.matches(source, language));
        before != self.entries.len()
    }

    /// Upload the full list as pretty JSON, replacing the snapshot
    pub async fn save(&self) -> Result<()> {
        let body = serde_json::to_vec_pretty(&self.entries)
            .map_err(|e| TermsyncError::operation("save dictionary", e.into()))?;

        self.store
            .put_object(&self.location, body, CONTENT_TYPE_JSON)
            .await
            .map_err(|e| TermsyncError::operation("save dictionary", e))?;

        info!("Saved {} dictionary entries to {}", self.entries.len(), self.location);
        Ok(())
    }

    /// Translate every entry with a blank translation. Failures are recorded
    /// in the report and the pass moves on to the next entry.
    pub async fn auto_translate_missing(
        &mut self,
        translator: &TextTranslator,
        cancel: &CancelFlag,
    ) -> Result<AutoFillReport> {
        let mut report = AutoFillReport::default();
        let pending = self.entries.iter().filter(|e| e.needs_translation()).count();
        info!("Auto-filling {} entries without translation", pending);

        for entry in self.entries.iter_mut().filter(|e| e.needs_translation()) {
            cancel.check()?;

            let language = if entry.language.trim().is_empty() {
                translator.default_target_language().to_string()
            } else {
                entry.language.trim().to_string()
            };

            match translator.translate(&entry.source, Some(language.as_str())).await {
                Ok(translation) => {
                    info!("{} -> [{}] {}", entry.source, language, translation);
                    entry.translation = translation;
                    report.translated += 1;
                }
                Err(e) => {
                    warn!("Failed to translate '{}' to {}: {}", entry.source, language, e.root_cause());
                    report.failures.push(AutoFillFailure {
                        source: entry.source.clone(),
                        language,
                        error: e.root_cause().to_string(),
                    });
                }
            }
        }

        info!(
            "Auto-fill finished: {} translated, {} failed",
            report.translated,
            report.failures.len()
        );
        Ok(report)
    }
}
