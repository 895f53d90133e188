//! In-memory image records for tests and single-process setups.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    errors::Result,
    models::Image,
    records::{ImageRecords, NewImage},
};

#[derive(Debug, Clone, Default)]
pub struct MemoryImageRecords {
    images: Arc<Mutex<Vec<Image>>>,
}

impl MemoryImageRecords {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageRecords for MemoryImageRecords {
    async fn insert(&self, image: NewImage) -> Result<Image> {
        let created = Image {
            id: Uuid::new_v4(),
            user_id: image.user_id,
            file_name: image.file_name,
            original_name: image.original_name,
            size: image.size,
            url: image.url,
            created_at: Utc::now(),
        };

        self.images.lock().await.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Image>> {
        Ok(self
            .images
            .lock()
            .await
            .iter()
            .find(|image| image.id == id)
            .cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Image>> {
        // Insertion order is chronological, so newest first is a reverse scan.
        Ok(self
            .images
            .lock()
            .await
            .iter()
            .rev()
            .filter(|image| image.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn remove(&self, id: Uuid) -> Result<bool> {
        let mut images = self.images.lock().await;
        let before = images.len();
        images.retain(|image| image.id != id);
        Ok(images.len() < before)
    }
}
