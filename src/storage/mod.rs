// Object storage abstraction
//
// Components address objects by bucket and key through the ObjectStore trait:
// - S3: Amazon S3 (or compatible) over signed REST calls
// - Local: a directory per bucket, for offline runs and tests

pub mod local;
pub mod s3;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use local::LocalStore;
pub use s3::S3Store;

use crate::aws::AwsHttp;
use crate::config::{Config, StorageBackend};
use crate::error::{Result, TermsyncError};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_CSV: &str = "text/csv";

/// Bucket and key of one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse an `s3://bucket/key` reference
    pub fn parse(uri: &str) -> Result<Self> {
        let location = Self::parse_prefix(uri)?;
        if location.key.is_empty() {
            return Err(TermsyncError::Validation(format!("Missing key in URI: {}", uri)));
        }
        Ok(location)
    }

    /// Parse an `s3://bucket/key` reference whose key may be a prefix.
    /// `s3://bucket/` names the whole bucket and yields an empty key.
    pub fn parse_prefix(uri: &str) -> Result<Self> {
        let rest = uri
            .trim()
            .strip_prefix("s3://")
            .ok_or_else(|| TermsyncError::Validation(format!("Not an s3:// URI: {}", uri)))?;

        let Some((bucket, key)) = rest.split_once('/') else {
            return Err(TermsyncError::Validation(format!("Missing key in URI: {}", uri)));
        };
        if bucket.is_empty() {
            return Err(TermsyncError::Validation(format!("Missing bucket in URI: {}", uri)));
        }

        Ok(Self::new(bucket, key))
    }

    /// Whole-bucket reference (`s3://bucket/`)
    pub fn is_bucket_root(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<String>,
}

/// Main trait for object storage operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object's bytes. A missing key is reported as `NotFound`.
    async fn get_object(&self, location: &ObjectLocation) -> Result<Vec<u8>>;

    /// Store an object, replacing any existing content
    async fn put_object(&self, location: &ObjectLocation, body: Vec<u8>, content_type: &str) -> Result<()>;

    /// List objects in `bucket` whose key starts with `prefix`
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>>;
}

/// Factory for creating object store instances
pub struct StorageFactory;

impl StorageFactory {
    /// Create the store selected by `storage.backend`
    pub fn create_store(config: &Config, http: Option<AwsHttp>) -> Result<Arc<dyn ObjectStore>> {
        match config.storage.backend {
            StorageBackend::S3 => {
                let http = http.ok_or_else(|| {
                    TermsyncError::Config("S3 backend requires AWS credentials".to_string())
                })?;
                Ok(Arc::new(S3Store::new(http, config.aws.s3_endpoint.clone())))
            }
            StorageBackend::Local => Ok(Arc::new(LocalStore::new(&config.storage.local_root))),
        }
    }
}
