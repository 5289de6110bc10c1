use anyhow::Result;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};

/// Disk-backed blob store for photo binaries.
///
/// Each blob is stored as a single flat file at `{dir}/{key}` where the key
/// is `{unix-millis}-{original filename}`. Callers reference blobs by the
/// public URL `{public_base}/{key}`; the key is recoverable as the URL's
/// last path segment.
pub struct BlobStore {
    dir: PathBuf,
    public_base: String,
}

/// Outcome of a successful upload.
pub struct StoredBlob {
    pub key: String,
    pub url: String,
}

impl BlobStore {
    pub async fn new(dir: PathBuf, public_base: String) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Blob storage directory: {}", dir.display());
        Ok(Self {
            dir,
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Build the storage key for an upload. The filename is flattened so a
    /// crafted name cannot escape the storage directory.
    pub fn make_key(timestamp_millis: i64, filename: &str) -> String {
        let safe: String = filename
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{timestamp_millis}-{safe}")
    }

    /// Write a blob and return its key and public URL.
    pub async fn put(&self, key: &str, data: &[u8]) -> Result<StoredBlob> {
        let path = self.blob_path(key);
        fs::write(&path, data).await?;
        Ok(StoredBlob {
            key: key.to_string(),
            url: format!("{}/{}", self.public_base, key),
        })
    }

    /// Delete a blob. A missing file is logged and tolerated so that photo
    /// removal still proceeds when the binary is already gone.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.blob_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted blob {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Blob {} already gone", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> BlobStore {
        let dir = std::env::temp_dir().join(format!("aperture-test-{}", uuid::Uuid::new_v4()));
        BlobStore::new(dir, "http://localhost:3000/media".to_string())
            .await
            .unwrap()
    }

    #[test]
    fn keys_carry_timestamp_and_sanitized_filename() {
        assert_eq!(BlobStore::make_key(1700000000000, "cat.jpg"), "1700000000000-cat.jpg");
        assert_eq!(
            BlobStore::make_key(1700000000000, "../../etc/passwd"),
            "1700000000000-.._.._etc_passwd"
        );
        assert_eq!(
            BlobStore::make_key(1, "my photo (1).png"),
            "1-my_photo__1_.png"
        );
    }

    #[tokio::test]
    async fn put_then_delete_round_trip() {
        let store = temp_store().await;

        let stored = store.put("1-cat.jpg", b"not really a jpeg").await.unwrap();
        assert_eq!(stored.url, "http://localhost:3000/media/1-cat.jpg");
        assert_eq!(
            fs::read(store.blob_path("1-cat.jpg")).await.unwrap(),
            b"not really a jpeg"
        );

        store.delete("1-cat.jpg").await.unwrap();
        assert!(fs::metadata(store.blob_path("1-cat.jpg")).await.is_err());

        // Double delete is tolerated.
        store.delete("1-cat.jpg").await.unwrap();
    }

    #[tokio::test]
    async fn public_base_trailing_slash_is_normalized() {
        let dir = std::env::temp_dir().join(format!("aperture-test-{}", uuid::Uuid::new_v4()));
        let store = BlobStore::new(dir, "http://host/media/".to_string())
            .await
            .unwrap();
        let stored = store.put("k", b"x").await.unwrap();
        assert_eq!(stored.url, "http://host/media/k");
    }
}
