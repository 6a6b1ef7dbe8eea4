//! Disk storage for product photos.
//!
//! Files live under `<root>/products/` and are served back at
//! `<public_base>/storage/<relative path>`.

use std::{
    borrow::Cow,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use axum::body::Bytes;
use tokio::fs;
use uuid::Uuid;
use validator::ValidationError;

use crate::error::AppResult;

pub const PHOTO_DIR: &str = "products";
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpeg", "png", "jpg", "gif"];

#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
}

impl ImageKind {
    /// Identify the image format from its leading signature bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageKind::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageKind::Gif)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PhotoStorage {
    root: PathBuf,
    public_base: String,
    max_kb: usize,
}

impl PhotoStorage {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>, max_kb: usize) -> Self {
        let public_base: String = public_base.into();
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
            max_kb,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_kb(&self) -> usize {
        self.max_kb
    }

    /// Check an upload against the allowed image types and the size limit.
    pub fn inspect(&self, photo: &UploadedPhoto) -> Result<ImageKind, ValidationError> {
        let type_error = || {
            ValidationError::new("mimes").with_message(Cow::Owned(format!(
                "The photo must be an image of type: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )))
        };

        if let Some(ext) = photo
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
        {
            if !ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
                return Err(type_error());
            }
        }

        if photo.bytes.len() > self.max_kb * 1024 {
            return Err(ValidationError::new("max").with_message(Cow::Owned(format!(
                "The photo may not be greater than {} kilobytes",
                self.max_kb
            ))));
        }

        ImageKind::sniff(&photo.bytes).ok_or_else(type_error)
    }

    /// Write the photo under a fresh name and return its relative path.
    pub async fn store(&self, kind: ImageKind, bytes: &[u8]) -> AppResult<String> {
        let relative = format!("{PHOTO_DIR}/{}.{}", Uuid::new_v4(), kind.extension());
        let full = self.root.join(&relative);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full, bytes).await?;
        tracing::debug!(path = %relative, size = bytes.len(), "photo stored");
        Ok(relative)
    }

    /// Remove a stored photo. A missing file is fine; other failures are logged.
    pub async fn delete(&self, path: &str) {
        let Some(full) = self.resolve(path) else {
            tracing::warn!(path, "refusing to delete photo outside storage root");
            return;
        };
        match fs::remove_file(&full).await {
            Ok(()) => tracing::debug!(path, "photo deleted"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(path, error = %err, "photo delete failed"),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/storage/{}", self.public_base, path.trim_start_matches('/'))
    }

    /// Absolute location of a relative path, or `None` if it would escape the root.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        if path.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    fn photo(name: &str, bytes: &[u8]) -> UploadedPhoto {
        UploadedPhoto {
            file_name: Some(name.to_string()),
            content_type: None,
            bytes: Bytes::copy_from_slice(bytes),
        }
    }

    #[test]
    fn inspect_accepts_known_images_and_rejects_the_rest() {
        let storage = PhotoStorage::new("/tmp/unused", "http://localhost", 2048);
        assert_eq!(storage.inspect(&photo("cat.PNG", PNG)).ok(), Some(ImageKind::Png));
        assert_eq!(
            storage.inspect(&photo("cat.gif", b"GIF89a....")).ok(),
            Some(ImageKind::Gif)
        );

        let err = storage.inspect(&photo("notes.txt", PNG)).unwrap_err();
        assert_eq!(err.code, "mimes");

        let err = storage.inspect(&photo("fake.png", b"plain text")).unwrap_err();
        assert_eq!(err.code, "mimes");
    }

    #[test]
    fn inspect_enforces_size_limit() {
        let storage = PhotoStorage::new("/tmp/unused", "http://localhost", 1);
        let mut big = PNG.to_vec();
        big.resize(2048, 0);
        let err = storage.inspect(&photo("big.png", &big)).unwrap_err();
        assert_eq!(err.code, "max");
        assert_eq!(
            err.message.as_deref(),
            Some("The photo may not be greater than 1 kilobytes")
        );
    }

    #[test]
    fn url_is_derived_from_public_base() {
        let storage = PhotoStorage::new("/tmp/unused", "http://localhost:3000/", 2048);
        assert_eq!(
            storage.url("products/a.png"),
            "http://localhost:3000/storage/products/a.png"
        );
    }

    #[test]
    fn resolve_rejects_traversal() {
        let storage = PhotoStorage::new("/srv/public", "http://localhost", 2048);
        assert!(storage.resolve("../etc/passwd").is_none());
        assert!(storage.resolve("/etc/passwd").is_none());
        assert!(storage.resolve("").is_none());
        assert_eq!(
            storage.resolve("products/a.png"),
            Some(PathBuf::from("/srv/public/products/a.png"))
        );
    }

    #[tokio::test]
    async fn store_then_delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PhotoStorage::new(dir.path(), "http://localhost", 2048);

        let path = storage.store(ImageKind::Png, PNG).await.unwrap();
        assert!(path.starts_with("products/"));
        assert!(path.ends_with(".png"));
        let full = storage.resolve(&path).unwrap();
        assert!(full.exists());

        storage.delete(&path).await;
        assert!(!full.exists());

        // deleting twice is not an error
        storage.delete(&path).await;
    }
}
