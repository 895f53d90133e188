use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::Image,
    quota::QuotaLedger,
    records::ImageRecords,
    storage::StorageBackend,
};

/// Listing and deletion of a user's images, keeping the quota ledger in step
/// with the stored file set.
pub struct Gallery {
    storage: Arc<dyn StorageBackend>,
    ledger: Arc<dyn QuotaLedger>,
    records: Arc<dyn ImageRecords>,
}

impl Gallery {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        ledger: Arc<dyn QuotaLedger>,
        records: Arc<dyn ImageRecords>,
    ) -> Self {
        Self {
            storage,
            ledger,
            records,
        }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Image>> {
        self.records.list_by_user(user_id).await
    }

    /// Removes an image: stored object first, then the reservation, then the
    /// record. A failing storage delete aborts before any accounting change —
    /// a record pointing at a missing object self-heals on the next attempt,
    /// while an unrecorded object on disk would never be reclaimed.
    pub async fn delete(&self, image_id: Uuid, requester_id: Uuid) -> Result<()> {
        let image = self
            .records
            .find_by_id(image_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if image.user_id != requester_id {
            return Err(AppError::Auth("User not authorized".to_string()));
        }

        self.storage.delete(&image.file_name).await?;
        self.ledger.release(image.user_id, image.size).await?;
        self.records.remove(image_id).await?;

        info!(
            image_id = %image_id,
            user_id = %requester_id,
            bytes = image.size,
            "Image removed"
        );
        Ok(())
    }
}
