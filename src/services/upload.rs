use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::Image,
    quota::QuotaLedger,
    records::{ImageRecords, NewImage},
    storage::{PublicUrls, StorageBackend},
    utils::file::{validate_extension, validate_mime_type},
};

/// One file of an upload batch, fully buffered by the HTTP layer.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub original_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    pub fn size(&self) -> i64 {
        self.bytes.len() as i64
    }
}

/// Batch-level validation ceilings.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_file_bytes: usize,
    pub max_batch_files: usize,
    pub allowed_mime_types: Vec<String>,
}

/// Coordinates validation, quota reservation and storage writes for an
/// upload batch.
///
/// A batch either commits completely or leaves no trace: quota is reserved
/// before the first write, and any failure mid-commit deletes the objects
/// written so far and releases the whole reservation. Validation failures
/// happen before any side effect.
pub struct UploadPipeline {
    storage: Arc<dyn StorageBackend>,
    ledger: Arc<dyn QuotaLedger>,
    records: Arc<dyn ImageRecords>,
    urls: PublicUrls,
    limits: UploadLimits,
}

impl UploadPipeline {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        ledger: Arc<dyn QuotaLedger>,
        records: Arc<dyn ImageRecords>,
        urls: PublicUrls,
        limits: UploadLimits,
    ) -> Self {
        Self {
            storage,
            ledger,
            records,
            urls,
            limits,
        }
    }

    /// Runs a batch through validate / reserve / commit. Created records are
    /// returned in input order.
    pub async fn upload(&self, user_id: Uuid, batch: Vec<CandidateFile>) -> Result<Vec<Image>> {
        self.validate(&batch)?;

        let total: i64 = batch.iter().map(|file| file.size()).sum();
        if !self.ledger.reserve(user_id, total).await? {
            return Err(AppError::QuotaExceeded(
                "Storage limit exceeded. Please upgrade your plan.".to_string(),
            ));
        }

        let mut stored: Vec<String> = Vec::with_capacity(batch.len());
        for file in &batch {
            match self.store_one(file).await {
                Ok(stored_name) => stored.push(stored_name),
                Err(e) => {
                    self.rollback(user_id, &stored, total).await;
                    return Err(e);
                }
            }
        }

        let mut created: Vec<Image> = Vec::with_capacity(batch.len());
        for (file, stored_name) in batch.iter().zip(&stored) {
            let record = NewImage {
                user_id,
                file_name: stored_name.clone(),
                original_name: file.original_name.clone(),
                size: file.size(),
                url: self.urls.url_for(stored_name),
            };
            match self.records.insert(record).await {
                Ok(image) => created.push(image),
                Err(e) => {
                    for image in &created {
                        if let Err(err) = self.records.remove(image.id).await {
                            warn!(
                                image_id = %image.id,
                                error = %err,
                                "Failed to remove record during rollback"
                            );
                        }
                    }
                    self.rollback(user_id, &stored, total).await;
                    return Err(e);
                }
            }
        }

        info!(
            user_id = %user_id,
            files = created.len(),
            bytes = total,
            "Upload batch committed"
        );
        Ok(created)
    }

    /// All-or-nothing batch validation: one bad file fails the whole request
    /// before anything is reserved or written.
    fn validate(&self, batch: &[CandidateFile]) -> Result<()> {
        if batch.is_empty() {
            return Err(AppError::Validation(
                "Please upload at least one image".to_string(),
            ));
        }
        if batch.len() > self.limits.max_batch_files {
            return Err(AppError::Validation(format!(
                "Too many files in one upload, the maximum is {}",
                self.limits.max_batch_files
            )));
        }

        for file in batch {
            validate_mime_type(&file.mime_type, &self.limits.allowed_mime_types)?;
            validate_extension(&file.original_name)?;
            if file.bytes.len() > self.limits.max_file_bytes {
                return Err(AppError::Validation(format!(
                    "'{}' exceeds the per-file limit of {} bytes",
                    file.original_name, self.limits.max_file_bytes
                )));
            }
        }

        Ok(())
    }

    /// Writes one file and confirms the object is actually observable. A
    /// backend that reports success without a readable object must not end up
    /// behind a committed record.
    async fn store_one(&self, file: &CandidateFile) -> Result<String> {
        let stored_name = self.storage.put(&file.original_name, &file.bytes).await?;

        match self.storage.exists(&stored_name).await {
            Ok(true) => Ok(stored_name),
            _ => {
                if let Err(err) = self.storage.delete(&stored_name).await {
                    warn!(
                        stored_name = %stored_name,
                        error = %err,
                        "Failed to delete unverifiable object"
                    );
                }
                Err(AppError::StorageWrite(format!(
                    "'{}' was not found in storage after write",
                    file.original_name
                )))
            }
        }
    }

    /// Best-effort compensation: objects written so far are deleted
    /// (idempotently) and the reservation is released in full.
    async fn rollback(&self, user_id: Uuid, stored: &[String], total: i64) {
        for stored_name in stored {
            if let Err(err) = self.storage.delete(stored_name).await {
                warn!(
                    stored_name = %stored_name,
                    error = %err,
                    "Failed to delete object during rollback"
                );
            }
        }
        if let Err(err) = self.ledger.release(user_id, total).await {
            warn!(
                user_id = %user_id,
                error = %err,
                "Failed to release reservation during rollback"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{png, FailingRecords, FakeStorage, Stack};

    #[tokio::test]
    async fn batch_commits_in_input_order() {
        let stack = Stack::new(FakeStorage::default(), 10_000).await;

        let created = stack
            .pipeline
            .upload(
                stack.user,
                vec![png("a.png", 100), png("b.png", 200), png("c.png", 300)],
            )
            .await
            .unwrap();

        assert_eq!(created.len(), 3);
        assert_eq!(created[0].original_name, "a.png");
        assert_eq!(created[1].original_name, "b.png");
        assert_eq!(created[2].original_name, "c.png");
        for image in &created {
            assert_eq!(image.user_id, stack.user);
            assert!(image
                .url
                .starts_with("http://localhost:5001/uploads/"));
            assert!(image.url.ends_with(&image.file_name));
            assert!(stack.storage.contains(&image.file_name).await);
        }

        assert_eq!(stack.ledger.used(stack.user).await.unwrap(), 600);
        assert_eq!(stack.storage.object_count().await, 3);

        // Listing is newest first.
        let listed = stack.records.list_by_user(stack.user).await.unwrap();
        assert_eq!(listed[0].original_name, "c.png");
        assert_eq!(listed[2].original_name, "a.png");
    }

    #[tokio::test]
    async fn one_disallowed_file_rejects_the_whole_batch() {
        let stack = Stack::new(FakeStorage::default(), 10_000).await;

        let mut batch = vec![png("a.png", 100), png("b.png", 100)];
        batch.push(CandidateFile {
            original_name: "anim.gif".to_string(),
            mime_type: "image/gif".to_string(),
            bytes: vec![0u8; 100],
        });

        let err = stack.pipeline.upload(stack.user, batch).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert_eq!(stack.ledger.used(stack.user).await.unwrap(), 0);
        assert_eq!(stack.storage.object_count().await, 0);
        assert!(stack
            .records
            .list_by_user(stack.user)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn mismatched_extension_rejects_the_batch() {
        let stack = Stack::new(FakeStorage::default(), 10_000).await;

        // Declared MIME is fine, the extension is not.
        let batch = vec![CandidateFile {
            original_name: "payload.exe".to_string(),
            mime_type: "image/png".to_string(),
            bytes: vec![0u8; 10],
        }];

        let err = stack.pipeline.upload(stack.user, batch).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(stack.storage.object_count().await, 0);
    }

    #[tokio::test]
    async fn oversized_file_rejects_the_batch() {
        let stack = Stack::new(FakeStorage::default(), 1_000_000).await;

        let batch = vec![png("ok.png", 100), png("huge.png", 2048)];
        let err = stack.pipeline.upload(stack.user, batch).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(stack.ledger.used(stack.user).await.unwrap(), 0);
        assert_eq!(stack.storage.object_count().await, 0);
    }

    #[tokio::test]
    async fn empty_and_oversized_batches_are_rejected() {
        let stack = Stack::new(FakeStorage::default(), 10_000).await;

        let err = stack
            .pipeline
            .upload(stack.user, Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let batch: Vec<CandidateFile> = (0..6).map(|i| png(&format!("f{}.png", i), 10)).collect();
        let err = stack.pipeline.upload(stack.user, batch).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn over_quota_batch_leaves_no_trace() {
        let stack = Stack::new(FakeStorage::default(), 500).await;

        let err = stack
            .pipeline
            .upload(stack.user, vec![png("a.png", 300), png("b.png", 300)])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::QuotaExceeded(_)));
        assert_eq!(stack.ledger.used(stack.user).await.unwrap(), 0);
        assert_eq!(stack.storage.object_count().await, 0);
        assert!(stack
            .records
            .list_by_user(stack.user)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn write_failure_mid_batch_rolls_everything_back() {
        let stack = Stack::new(FakeStorage::failing_put(3), 10_000).await;

        let batch: Vec<CandidateFile> = (0..5).map(|i| png(&format!("f{}.png", i), 100)).collect();
        let err = stack.pipeline.upload(stack.user, batch).await.unwrap_err();

        assert!(matches!(err, AppError::StorageWrite(_)));
        assert_eq!(stack.ledger.used(stack.user).await.unwrap(), 0);
        // Files 1 and 2 were written before the failure and must be gone.
        assert_eq!(stack.storage.object_count().await, 0);
        assert!(stack
            .records
            .list_by_user(stack.user)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn phantom_write_is_treated_as_a_failed_write() {
        let stack = Stack::new(FakeStorage::phantom_put(2), 10_000).await;

        let batch: Vec<CandidateFile> = (0..3).map(|i| png(&format!("f{}.png", i), 100)).collect();
        let err = stack.pipeline.upload(stack.user, batch).await.unwrap_err();

        assert!(matches!(err, AppError::StorageWrite(_)));
        assert_eq!(stack.ledger.used(stack.user).await.unwrap(), 0);
        assert_eq!(stack.storage.object_count().await, 0);
    }

    #[tokio::test]
    async fn record_insert_failure_rolls_back_files_and_records() {
        let stack = Stack::new(FakeStorage::default(), 10_000).await;

        let failing = Arc::new(FailingRecords::new(stack.records.clone(), 2));
        let pipeline = UploadPipeline::new(
            stack.storage.clone(),
            stack.ledger.clone(),
            failing,
            crate::storage::PublicUrls::new("http://localhost:5001", "uploads"),
            crate::services::testing::test_limits(),
        );

        let batch: Vec<CandidateFile> = (0..3).map(|i| png(&format!("f{}.png", i), 100)).collect();
        let err = pipeline.upload(stack.user, batch).await.unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(stack.ledger.used(stack.user).await.unwrap(), 0);
        assert_eq!(stack.storage.object_count().await, 0);
        assert!(stack
            .records
            .list_by_user(stack.user)
            .await
            .unwrap()
            .is_empty());
    }
}
