use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, TermsyncError};

// Default values for optional configuration fields
fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_local_root() -> String {
    ".termsync/buckets".to_string()
}

fn default_dictionary_key() -> String {
    "dictionary/custom-dictionary.json".to_string()
}

fn default_csv_key() -> String {
    "dictionary/custom-terminology.csv".to_string()
}

fn default_target_language() -> String {
    "es".to_string()
}

fn default_batch_content_type() -> String {
    "text/plain".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aws: AwsConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Region used for both S3 and Translate
    #[serde(default = "default_region")]
    pub region: String,
    /// Access key id; read from the environment at startup when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    /// Override for S3-compatible endpoints (switches to path-style URLs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_endpoint: Option<String>,
    /// Override for the Translate endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate_endpoint: Option<String>,
    /// HTTP timeout per request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Amazon S3 or a compatible service
    S3,
    /// Local directory tree, one sub-directory per bucket
    Local,
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::S3
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Bucket holding the dictionary snapshot and terminology CSV
    pub bucket: String,
    /// Root directory for the local backend
    #[serde(default = "default_local_root")]
    pub local_root: String,
    /// Key of the dictionary JSON snapshot
    #[serde(default = "default_dictionary_key")]
    pub dictionary_key: String,
    /// Key of the exported terminology CSV
    #[serde(default = "default_csv_key")]
    pub csv_key: String,
    /// Append a timestamp to the CSV key on every export
    #[serde(default)]
    pub timestamp_csv_key: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Target language used when a caller does not name one
    #[serde(default = "default_target_language")]
    pub default_target_language: String,
    /// Custom terminology applied to translations and replaced on import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_terminology_name: Option<String>,
    /// Data access role for managed batch jobs. When set, bulk translation is
    /// handed to the service; otherwise it runs item by item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_role_arn: Option<String>,
    /// Content type declared for batch job input
    #[serde(default = "default_batch_content_type")]
    pub batch_content_type: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            s3_endpoint: None,
            translate_endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            default_target_language: default_target_language(),
            custom_terminology_name: None,
            service_role_arn: None,
            batch_content_type: default_batch_content_type(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aws: AwsConfig::default(),
            storage: StorageConfig {
                backend: StorageBackend::S3,
                bucket: "my-translation-bucket".to_string(),
                local_root: default_local_root(),
                dictionary_key: default_dictionary_key(),
                csv_key: default_csv_key(),
                timestamp_csv_key: false,
            },
            translate: TranslateConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TermsyncError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| TermsyncError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TermsyncError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TermsyncError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Check required fields eagerly so misconfiguration surfaces at startup
    pub fn validate(&self) -> Result<()> {
        require("aws.region", &self.aws.region)?;
        require("storage.bucket", &self.storage.bucket)?;
        require("storage.dictionary_key", &self.storage.dictionary_key)?;
        require("storage.csv_key", &self.storage.csv_key)?;
        require("translate.default_target_language", &self.translate.default_target_language)?;
        require("translate.batch_content_type", &self.translate.batch_content_type)?;

        if self.storage.backend == StorageBackend::Local {
            require("storage.local_root", &self.storage.local_root)?;
        }

        for (field, value) in [
            ("translate.service_role_arn", &self.translate.service_role_arn),
            ("translate.custom_terminology_name", &self.translate.custom_terminology_name),
        ] {
            if let Some(value) = value {
                require(field, value)?;
            }
        }

        if self.aws.access_key_id.is_some() != self.aws.secret_access_key.is_some() {
            return Err(TermsyncError::Config(
                "aws.access_key_id and aws.secret_access_key must be set together".to_string(),
            ));
        }

        if self.aws.timeout_secs == 0 {
            return Err(TermsyncError::Config("aws.timeout_secs must be positive".to_string()));
        }

        Ok(())
    }

    /// Whether bulk translation is delegated to a managed batch job
    pub fn uses_batch_jobs(&self) -> bool {
        self.translate.service_role_arn.is_some()
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(TermsyncError::Config(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}
