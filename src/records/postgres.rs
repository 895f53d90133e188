use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    errors::Result,
    models::Image,
    records::{ImageRecords, NewImage},
};

#[derive(Clone)]
pub struct PgImageRecords {
    pool: PgPool,
}

impl PgImageRecords {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageRecords for PgImageRecords {
    async fn insert(&self, image: NewImage) -> Result<Image> {
        let created = sqlx::query_as::<_, Image>(
            "INSERT INTO images (user_id, file_name, original_name, size, url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, user_id, file_name, original_name, size, url, created_at",
        )
        .bind(image.user_id)
        .bind(&image.file_name)
        .bind(&image.original_name)
        .bind(image.size)
        .bind(&image.url)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Image>> {
        let image = sqlx::query_as::<_, Image>(
            "SELECT id, user_id, file_name, original_name, size, url, created_at \
             FROM images WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(image)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>(
            "SELECT id, user_id, file_name, original_name, size, url, created_at \
             FROM images WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    async fn remove(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
