//! Blob storage trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::CollaboratorError;

const SERVICE: &str = "blob storage";

/// A stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Public URL of the blob.
    pub url: String,
    /// Name used to delete the blob later.
    pub blob_name: String,
}

/// Trait for image storage.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Uploads `data` and returns where it landed.
    async fn upload(
        &self,
        container: &str,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<StoredBlob, CollaboratorError>;

    /// Deletes a blob. Deleting a missing blob is not an error.
    async fn delete(&self, container: &str, blob_name: &str) -> Result<(), CollaboratorError>;
}

#[derive(Debug, Default)]
struct InMemoryBlobState {
    blobs: HashMap<(String, String), (String, Vec<u8>)>,
    fail_on_upload: bool,
    fail_on_delete: bool,
}

/// In-memory blob storage for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStorage {
    state: Arc<RwLock<InMemoryBlobState>>,
}

impl InMemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures uploads to fail.
    pub async fn set_fail_on_upload(&self, fail: bool) {
        self.state.write().await.fail_on_upload = fail;
    }

    /// Configures deletes to fail.
    pub async fn set_fail_on_delete(&self, fail: bool) {
        self.state.write().await.fail_on_delete = fail;
    }

    /// Returns the number of stored blobs.
    pub async fn blob_count(&self) -> usize {
        self.state.read().await.blobs.len()
    }

    /// Returns true if the blob exists.
    pub async fn contains(&self, container: &str, blob_name: &str) -> bool {
        self.state
            .read()
            .await
            .blobs
            .contains_key(&(container.to_string(), blob_name.to_string()))
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    async fn upload(
        &self,
        container: &str,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<StoredBlob, CollaboratorError> {
        let mut state = self.state.write().await;
        if state.fail_on_upload {
            return Err(CollaboratorError::new(SERVICE, "upload rejected"));
        }

        let blob_name = format!("{}-{}", Uuid::new_v4(), file_name.trim());
        let url = format!("memory://{container}/{blob_name}");
        state.blobs.insert(
            (container.to_string(), blob_name.clone()),
            (content_type.to_string(), data.to_vec()),
        );
        Ok(StoredBlob { url, blob_name })
    }

    async fn delete(&self, container: &str, blob_name: &str) -> Result<(), CollaboratorError> {
        let mut state = self.state.write().await;
        if state.fail_on_delete {
            return Err(CollaboratorError::new(SERVICE, "delete rejected"));
        }
        state
            .blobs
            .remove(&(container.to_string(), blob_name.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_delete() {
        let storage = InMemoryBlobStorage::new();
        let blob = storage
            .upload("event-images", "poster.png", "image/png", b"png")
            .await
            .unwrap();
        assert!(blob.blob_name.ends_with("poster.png"));
        assert!(storage.contains("event-images", &blob.blob_name).await);

        storage.delete("event-images", &blob.blob_name).await.unwrap();
        assert_eq!(storage.blob_count().await, 0);
    }

    #[tokio::test]
    async fn test_failure_toggles() {
        let storage = InMemoryBlobStorage::new();
        storage.set_fail_on_upload(true).await;
        assert!(storage.upload("c", "a.png", "image/png", b"").await.is_err());

        storage.set_fail_on_delete(true).await;
        assert!(storage.delete("c", "a.png").await.is_err());
    }
}
