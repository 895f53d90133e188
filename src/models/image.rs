use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A hosted image. `file_name` is the opaque stored name the bytes live
/// under; `original_name` is what the client called the file and is kept for
/// display only, it never addresses storage.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Image {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub original_name: String,
    pub size: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
}
