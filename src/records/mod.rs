use async_trait::async_trait;
use uuid::Uuid;

use crate::{errors::Result, models::Image};

pub mod memory;
pub mod postgres;

/// Fields of an image record before it is persisted.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub user_id: Uuid,
    pub file_name: String,
    pub original_name: String,
    pub size: i64,
    pub url: String,
}

/// Durable store of image records.
#[async_trait]
pub trait ImageRecords: Send + Sync {
    async fn insert(&self, image: NewImage) -> Result<Image>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Image>>;

    /// All images owned by the user, newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Image>>;

    /// Removes a record, returning whether it existed.
    async fn remove(&self, id: Uuid) -> Result<bool>;
}
