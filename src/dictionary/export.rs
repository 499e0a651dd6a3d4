use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::error::{Result, TermsyncError};
use crate::storage::{ObjectLocation, ObjectStore, CONTENT_TYPE_CSV};
use crate::translate::SOURCE_LANGUAGE;
use super::{normalize, DictionaryEntry};

/// Where an export was written and how many terms it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub location: ObjectLocation,
    pub rows: usize,
}

/// Writes per-language terminology CSVs for import into the translation service
pub struct CsvExporter {
    store: Arc<dyn ObjectStore>,
    location: ObjectLocation,
    timestamp_key: bool,
}

impl CsvExporter {
    pub fn new(store: Arc<dyn ObjectStore>, location: ObjectLocation, timestamp_key: bool) -> Self {
        Self {
            store,
            location,
            timestamp_key,
        }
    }

    /// Export the entries for `target_language` and upload them, replacing
    /// whatever the destination key held
    pub async fn export(&self, entries: &[DictionaryEntry], target_language: &str) -> Result<CsvExport> {
        let target = normalize(target_language);
        if target.is_empty() {
            return Err(TermsyncError::Validation("target language must not be empty".to_string()));
        }

        let (csv, rows) = render_csv(entries, &target)
            .map_err(|e| TermsyncError::operation("export terminology CSV", e))?;

        let location = if self.timestamp_key {
            ObjectLocation::new(&self.location.bucket, timestamped_key(&self.location.key, Utc::now()))
        } else {
            self.location.clone()
        };

        self.store
            .put_object(&location, csv.into_bytes(), CONTENT_TYPE_CSV)
            .await
            .map_err(|e| TermsyncError::operation("export terminology CSV", e))?;

        info!("Exported {} {} terms to {}", rows, target, location);
        Ok(CsvExport { location, rows })
    }
}

/// Render the two-column CSV (`en,<target>`) for an already-normalized
/// target tag. Returns the text and the number of data rows.
pub fn render_csv(entries: &[DictionaryEntry], target: &str) -> Result<(String, usize)> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([SOURCE_LANGUAGE, target])?;

    let mut rows = 0;
    for entry in entries.iter().filter(|e| normalize(&e.language) == target) {
        let source = entry.source.trim();
        let translation = entry.translation.trim();
        if source.is_empty() || translation.is_empty() {
            continue;
        }
        writer.write_record([source, translation])?;
        rows += 1;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TermsyncError::Storage(format!("Failed to finish CSV: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| TermsyncError::Storage(format!("CSV is not UTF-8: {}", e)))?;

    Ok((text, rows))
}

/// `dir/name.csv` -> `dir/name-YYYYMMDDHHMMSS.csv`
pub fn timestamped_key(key: &str, now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y%m%d%H%M%S");
    let (dir, file) = match key.rfind('/') {
        Some(idx) => key.split_at(idx + 1),
        None => ("", key),
    };
    match file.rfind('.') {
        Some(idx) if idx > 0 => format!("{}{}-{}{}", dir, &file[..idx], stamp, &file[idx..]),
        _ => format!("{}{}-{}", dir, file, stamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStore;
    use chrono::TimeZone;

    fn sample_entries() -> Vec<DictionaryEntry> {
        vec![
            DictionaryEntry::new("hello", "fr", "bonjour"),
            DictionaryEntry::new("x", "de", "y"),
        ]
    }

    #[test]
    fn test_render_filters_by_language() {
        let (csv, rows) = render_csv(&sample_entries(), "fr").unwrap();

        assert_eq!(rows, 1);
        assert_eq!(csv, "en,fr\nhello,bonjour\n");
    }

    #[test]
    fn test_render_skips_blank_and_trims() {
        let entries = vec![
            DictionaryEntry::new("  cat ", "FR ", " chat "),
            DictionaryEntry::new("dog", "fr", "   "),
            DictionaryEntry::new("  ", "fr", "vide"),
            DictionaryEntry::new("rock, paper", "fr", "pierre, papier"),
        ];
        let (csv, rows) = render_csv(&entries, "fr").unwrap();

        assert_eq!(rows, 2);
        assert_eq!(csv, "en,fr\ncat,chat\n\"rock, paper\",\"pierre, papier\"\n");
    }

    #[test]
    fn test_timestamped_key() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();

        assert_eq!(
            timestamped_key("dictionary/custom-terminology.csv", now),
            "dictionary/custom-terminology-20240501083000.csv"
        );
        assert_eq!(timestamped_key("terms", now), "terms-20240501083000");
        assert_eq!(timestamped_key("a.b/.hidden", now), "a.b/.hidden-20240501083000");
    }

    #[tokio::test]
    async fn test_export_uploads_csv() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(LocalStore::new(dir.path()));
        let location = ObjectLocation::new("terms", "dictionary/custom-terminology.csv");
        let exporter = CsvExporter::new(store.clone(), location.clone(), false);

        let export = exporter.export(&sample_entries(), " FR").await.unwrap();

        assert_eq!(export.rows, 1);
        assert_eq!(export.location, location);
        let body = store.get_object(&location).await.unwrap();
        assert_eq!(String::from_utf8(body).unwrap(), "en,fr\nhello,bonjour\n");
    }

    #[tokio::test]
    async fn test_export_with_timestamped_key() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(LocalStore::new(dir.path()));
        let location = ObjectLocation::new("terms", "dictionary/custom-terminology.csv");
        let exporter = CsvExporter::new(store.clone(), location.clone(), true);

        let export = exporter.export(&sample_entries(), "de").await.unwrap();

        assert_ne!(export.location, location);
        assert!(export.location.key.starts_with("dictionary/custom-terminology-"));
        assert!(export.location.key.ends_with(".csv"));
        assert!(store.get_object(&export.location).await.is_ok());
    }

    #[tokio::test]
    async fn test_export_rejects_blank_target() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(
            Arc::new(LocalStore::new(dir.path())),
            ObjectLocation::new("terms", "terms.csv"),
            false,
        );

        let result = exporter.export(&sample_entries(), "  ").await;
        assert!(matches!(result, Err(TermsyncError::Validation(_))));
    }
}
