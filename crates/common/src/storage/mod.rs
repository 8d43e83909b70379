//! Image storage
//!
//! Stored names are generated server-side (`{uuid}.{ext}`) and the client
//! filename is only ever consulted for its extension, so uploads cannot
//! collide with or overwrite each other and cannot carry path components
//! into the store.

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

/// Image extensions accepted for upload
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// An image as received from the client
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-supplied filename; used only for the extension check
    pub filename: String,

    /// Raw file content
    pub data: Vec<u8>,
}

/// Extract the lowercased extension if it is on the allowlist
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();

    ALLOWED_IMAGE_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Capability interface for the binary-object store the content lifecycle
/// calls through
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Validate and persist an upload, returning the generated stored name
    async fn save(&self, upload: ImageUpload) -> Result<String>;

    /// Remove a stored image; missing files are not an error
    async fn delete(&self, stored_name: &str) -> Result<()>;
}

/// Filesystem-backed image store
pub struct FsImageStore {
    root: PathBuf,
    max_bytes: usize,
}

impl FsImageStore {
    /// Create a store rooted at `dir`, creating the directory if needed
    pub async fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Result<Self> {
        let root = dir.into();
        fs::create_dir_all(&root).await?;

        Ok(Self { root, max_bytes })
    }

    fn path_for(&self, stored_name: &str) -> PathBuf {
        self.root.join(stored_name)
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(&self, upload: ImageUpload) -> Result<String> {
        let extension =
            allowed_extension(&upload.filename).ok_or_else(|| AppError::UnsupportedMedia {
                extension: upload
                    .filename
                    .rsplit_once('.')
                    .map(|(_, ext)| ext.to_ascii_lowercase()),
            })?;

        if upload.data.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge {
                size: upload.data.len(),
                limit: self.max_bytes,
            });
        }

        let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
        fs::write(self.path_for(&stored_name), &upload.data).await?;

        Ok(stored_name)
    }

    async fn delete(&self, stored_name: &str) -> Result<()> {
        match fs::remove_file(self.path_for(stored_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extension() {
        assert_eq!(allowed_extension("photo.PNG"), Some("png".to_string()));
        assert_eq!(allowed_extension("a.b.jpeg"), Some("jpeg".to_string()));
        assert_eq!(allowed_extension("script.exe"), None);
        assert_eq!(allowed_extension("no_extension"), None);
    }

    #[tokio::test]
    async fn test_save_generates_decoupled_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), 1024).await.unwrap();

        let name = store
            .save(ImageUpload {
                filename: "../../../etc/passwd.png".to_string(),
                data: vec![1, 2, 3],
            })
            .await
            .unwrap();

        // The stored name carries the extension only, never the client path
        assert!(name.ends_with(".png"));
        assert!(!name.contains('/'));
        assert!(dir.path().join(&name).exists());
    }

    #[tokio::test]
    async fn test_save_rejects_disallowed_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), 1024).await.unwrap();

        let err = store
            .save(ImageUpload {
                filename: "malware.exe".to_string(),
                data: vec![0],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnsupportedMedia { .. }));
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_upload() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), 4).await.unwrap();

        let err = store
            .save(ImageUpload {
                filename: "big.jpg".to_string(),
                data: vec![0; 5],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_tolerant_of_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), 1024).await.unwrap();

        store.delete("never-stored.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_removes_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), 1024).await.unwrap();

        let name = store
            .save(ImageUpload {
                filename: "cover.gif".to_string(),
                data: vec![9, 9],
            })
            .await
            .unwrap();

        assert!(dir.path().join(&name).exists());
        store.delete(&name).await.unwrap();
        assert!(!dir.path().join(&name).exists());
    }
}
