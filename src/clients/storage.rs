use std::path::{Component, Path, PathBuf};

use anyhow::{Context, bail};
use async_trait::async_trait;
use aws_sdk_s3::{Client as S3Client, primitives::ByteStream};

/// Permanent home of uploaded images.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<()>;

    /// Removes the object; `Ok(false)` when it was already gone.
    async fn delete(&self, key: &str) -> anyhow::Result<bool>;

    fn url(&self, key: &str) -> String;
}

pub struct S3Storage {
    client: S3Client,
    bucket: String,
    public_base: String,
}

impl S3Storage {
    pub async fn from_env(bucket: String, public_base: Option<String>) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = S3Client::new(&aws_config);
        let public_base =
            public_base.unwrap_or_else(|| format!("https://{bucket}.s3.amazonaws.com"));
        Self {
            client,
            bucket,
            public_base,
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("S3 upload of {key} failed"))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<bool> {
        if let Err(err) = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            let err = err.into_service_error();
            if err.is_not_found() {
                return Ok(false);
            }
            return Err(anyhow::Error::new(err).context(format!("S3 lookup of {key} failed")));
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("S3 delete of {key} failed"))?;
        Ok(true)
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base.trim_end_matches('/'), key)
    }
}

/// Disk-backed store for development and tests.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            bail!("invalid object key {key:?}");
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err).with_context(|| format!("removing {}", path.display())),
        }
    }

    fn url(&self, key: &str) -> String {
        format!("/storage/{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_storage_round_trip_and_missing_delete() {
        let root = std::env::temp_dir().join(format!("tourism-api-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(&root);

        storage
            .put("users/abc/1-photo.png", b"png".to_vec(), "image/png")
            .await
            .unwrap();
        assert!(root.join("users/abc/1-photo.png").exists());
        assert!(storage.delete("users/abc/1-photo.png").await.unwrap());
        assert!(!storage.delete("users/abc/1-photo.png").await.unwrap());

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn local_storage_rejects_traversal() {
        let storage = LocalStorage::new("/tmp/unused");
        assert!(storage.path_for("../etc/passwd").is_err());
        assert!(storage.path_for("/abs").is_err());
        assert_eq!(storage.url("users/a.png"), "/storage/users/a.png");
    }
}
