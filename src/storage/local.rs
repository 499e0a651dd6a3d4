use async_trait::async_trait;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, TermsyncError};
use super::{ObjectLocation, ObjectStore, ObjectSummary};

/// Directory-backed object store: `<root>/<bucket>/<key>`
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        Ok(self.root.join(checked_relative(bucket)?))
    }

    fn object_path(&self, location: &ObjectLocation) -> Result<PathBuf> {
        Ok(self.bucket_dir(&location.bucket)?.join(checked_relative(&location.key)?))
    }
}

/// Reject keys that would escape the bucket directory
fn checked_relative(name: &str) -> Result<&Path> {
    let path = Path::new(name);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));

    if name.is_empty() || escapes {
        return Err(TermsyncError::Storage(format!("Invalid object name: {}", name)));
    }
    Ok(path)
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn get_object(&self, location: &ObjectLocation) -> Result<Vec<u8>> {
        let path = self.object_path(location)?;
        debug!("Reading {}", path.display());

        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(TermsyncError::NotFound(location.to_string())),
            Err(e) => Err(TermsyncError::Storage(format!("Failed to read {}: {}", location, e))),
        }
    }

    async fn put_object(&self, location: &ObjectLocation, body: Vec<u8>, _content_type: &str) -> Result<()> {
        let path = self.object_path(location)?;
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&parent).await
            .map_err(|e| TermsyncError::Storage(format!("Failed to create {}: {}", parent.display(), e)))?;

        // readers never see a partial object
        let size = body.len();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut file = tempfile::NamedTempFile::new_in(&parent)?;
            file.write_all(&body)?;
            file.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| TermsyncError::Storage(format!("Failed to write {}: {}", location, e)))?
        .map_err(|e| TermsyncError::Storage(format!("Failed to write {}: {}", location, e)))?;

        info!("Stored {} ({} bytes)", location, size);
        Ok(())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let bucket_dir = self.bucket_dir(bucket)?;
        if !bucket_dir.is_dir() {
            return Err(TermsyncError::NotFound(format!("s3://{}", bucket)));
        }

        let mut objects = Vec::new();
        let mut pending = vec![bucket_dir.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await
                .map_err(|e| TermsyncError::Storage(format!("Failed to list {}: {}", dir.display(), e)))?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let metadata = entry.metadata().await?;
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&bucket_dir) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                if key.starts_with(prefix) {
                    let last_modified = metadata
                        .modified()
                        .ok()
                        .map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339());
                    objects.push(ObjectSummary {
                        key,
                        size: metadata.len(),
                        last_modified,
                    });
                }
            }
        }

        // S3 lists keys in lexicographic order
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}
