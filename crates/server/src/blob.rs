//! Storage for uploaded images (avatars).

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use uuid::Uuid;

use crate::ServerError;

/// Reference to a stored blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<StoredBlob, ServerError>;

    /// Removing an unknown id succeeds.
    async fn delete(&self, id: &str) -> Result<(), ServerError>;
}

/// Writes blobs as files under `root`; they are served from `url_prefix`.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
    url_prefix: String,
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, ServerError> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
        if !valid {
            return Err(ServerError::Generic(format!("invalid blob id: {id}")));
        }
        Ok(self.root.join(id))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<StoredBlob, ServerError> {
        let ext = extension_for(content_type).ok_or_else(|| {
            ServerError::Generic(format!("unsupported image type: {content_type}"))
        })?;
        let id = format!("{}.{ext}", Uuid::new_v4());
        let path = self.path_for(&id)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ServerError::Internal(format!("failed to create upload dir: {e}")))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ServerError::Internal(format!("failed to store blob: {e}")))?;

        tracing::debug!(blob_id = %id, "blob stored");
        Ok(StoredBlob {
            url: format!("{}/{id}", self.url_prefix),
            id,
        })
    }

    async fn delete(&self, id: &str) -> Result<(), ServerError> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ServerError::Internal(format!("failed to delete blob: {err}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../target/test_uploads")
            .join(Uuid::new_v4().to_string())
    }

    #[tokio::test]
    async fn upload_then_delete() {
        let store = LocalBlobStore::new(scratch_dir(), "/uploads/");
        let blob = store.upload(vec![1, 2, 3], "image/png").await.unwrap();
        assert!(blob.id.ends_with(".png"));
        assert_eq!(blob.url, format!("/uploads/{}", blob.id));

        let stored = tokio::fs::read(store.root().join(&blob.id)).await.unwrap();
        assert_eq!(stored, vec![1, 2, 3]);

        store.delete(&blob.id).await.unwrap();
        assert!(!store.root().join(&blob.id).exists());
        // Second delete is a no-op.
        store.delete(&blob.id).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_non_images_and_traversal() {
        let store = LocalBlobStore::new(scratch_dir(), "/uploads");
        assert!(matches!(
            store.upload(vec![0], "application/pdf").await,
            Err(ServerError::Generic(_))
        ));
        assert!(matches!(
            store.delete("../settings.toml").await,
            Err(ServerError::Generic(_))
        ));
    }
}
