use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    storage::StorageBackend,
    utils::file::file_extension,
};

/// Disk-backed storage rooted at a configured directory. Stored names are
/// UUIDs plus the sanitized extension of the client name, so client text can
/// never collide with or escape the upload directory.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            AppError::StorageWrite(format!("Failed to create upload directory: {}", e))
        })?;

        Ok(Self { base_path })
    }

    fn full_path(&self, stored_name: &str) -> PathBuf {
        self.base_path.join(stored_name)
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn put(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let stored_name = match file_extension(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        fs::write(self.full_path(&stored_name), bytes)
            .await
            .map_err(|e| AppError::StorageWrite(format!("Failed to write file: {}", e)))?;

        Ok(stored_name)
    }

    async fn exists(&self, stored_name: &str) -> Result<bool> {
        fs::try_exists(self.full_path(stored_name))
            .await
            .map_err(|e| AppError::StorageWrite(format!("Failed to stat file: {}", e)))
    }

    async fn delete(&self, stored_name: &str) -> Result<()> {
        match fs::remove_file(self.full_path(stored_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::StorageDelete(format!(
                "Failed to delete file: {}",
                e
            ))),
        }
    }
}
