//! Shared fixtures for the service tests: a scriptable storage fake and a
//! fully wired pipeline/gallery stack over the in-memory collaborators.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    models::{Image, PlanTier},
    quota::{memory::MemoryQuotaLedger, PlanLimits},
    records::{memory::MemoryImageRecords, ImageRecords, NewImage},
    services::{
        gallery::Gallery,
        upload::{CandidateFile, UploadLimits, UploadPipeline},
    },
    storage::{PublicUrls, StorageBackend},
    utils::file::file_extension,
};

/// Storage fake with scriptable failures. Put calls are counted from 1.
#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    puts: Mutex<usize>,
    fail_on_put: Option<usize>,
    phantom_on_put: Option<usize>,
    fail_delete: bool,
}

impl FakeStorage {
    /// Fails the `n`th put call outright.
    pub fn failing_put(n: usize) -> Self {
        Self {
            fail_on_put: Some(n),
            ..Self::default()
        }
    }

    /// The `n`th put call reports success without writing anything.
    pub fn phantom_put(n: usize) -> Self {
        Self {
            phantom_on_put: Some(n),
            ..Self::default()
        }
    }

    /// Every delete call fails with an I/O error.
    pub fn failing_delete() -> Self {
        Self {
            fail_delete: true,
            ..Self::default()
        }
    }

    pub async fn object_count(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn contains(&self, stored_name: &str) -> bool {
        self.objects.lock().await.contains_key(stored_name)
    }

    pub async fn seed(&self, stored_name: &str, bytes: &[u8]) {
        self.objects
            .lock()
            .await
            .insert(stored_name.to_string(), bytes.to_vec());
    }
}

#[async_trait]
impl StorageBackend for FakeStorage {
    async fn put(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let call = {
            let mut puts = self.puts.lock().await;
            *puts += 1;
            *puts
        };

        if self.fail_on_put == Some(call) {
            return Err(AppError::StorageWrite("disk full".to_string()));
        }

        let stored_name = match file_extension(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        if self.phantom_on_put != Some(call) {
            self.objects
                .lock()
                .await
                .insert(stored_name.clone(), bytes.to_vec());
        }

        Ok(stored_name)
    }

    async fn exists(&self, stored_name: &str) -> Result<bool> {
        Ok(self.objects.lock().await.contains_key(stored_name))
    }

    async fn delete(&self, stored_name: &str) -> Result<()> {
        if self.fail_delete {
            return Err(AppError::StorageDelete("device offline".to_string()));
        }
        self.objects.lock().await.remove(stored_name);
        Ok(())
    }
}

/// Record store wrapper that fails after a set number of inserts.
pub struct FailingRecords {
    inner: Arc<MemoryImageRecords>,
    allow_inserts: usize,
    inserts: Mutex<usize>,
}

impl FailingRecords {
    pub fn new(inner: Arc<MemoryImageRecords>, allow_inserts: usize) -> Self {
        Self {
            inner,
            allow_inserts,
            inserts: Mutex::new(0),
        }
    }
}

#[async_trait]
impl ImageRecords for FailingRecords {
    async fn insert(&self, image: NewImage) -> Result<Image> {
        let call = {
            let mut inserts = self.inserts.lock().await;
            *inserts += 1;
            *inserts
        };
        if call > self.allow_inserts {
            return Err(AppError::Internal(anyhow::anyhow!("record store down")));
        }
        self.inner.insert(image).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Image>> {
        self.inner.find_by_id(id).await
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Image>> {
        self.inner.list_by_user(user_id).await
    }

    async fn remove(&self, id: Uuid) -> Result<bool> {
        self.inner.remove(id).await
    }
}

pub fn test_limits() -> UploadLimits {
    UploadLimits {
        max_file_bytes: 1024,
        max_batch_files: 5,
        allowed_mime_types: vec![
            "image/jpeg".to_string(),
            "image/png".to_string(),
            "image/webp".to_string(),
        ],
    }
}

pub fn png(name: &str, size: usize) -> CandidateFile {
    CandidateFile {
        original_name: name.to_string(),
        mime_type: "image/png".to_string(),
        bytes: vec![0u8; size],
    }
}

/// Pipeline and gallery wired over the fake storage and in-memory
/// collaborators, with one registered free-plan user whose limit is `limit`.
pub struct Stack {
    pub storage: Arc<FakeStorage>,
    pub ledger: Arc<MemoryQuotaLedger>,
    pub records: Arc<MemoryImageRecords>,
    pub pipeline: UploadPipeline,
    pub gallery: Gallery,
    pub user: Uuid,
}

impl Stack {
    pub async fn new(storage: FakeStorage, limit: i64) -> Self {
        let storage = Arc::new(storage);
        let ledger = Arc::new(MemoryQuotaLedger::new(PlanLimits {
            free: limit,
            pro: limit,
            business: limit,
        }));
        let records = Arc::new(MemoryImageRecords::new());
        let user = Uuid::new_v4();
        ledger.register(user, PlanTier::Free).await;

        let pipeline = UploadPipeline::new(
            storage.clone(),
            ledger.clone(),
            records.clone(),
            PublicUrls::new("http://localhost:5001", "uploads"),
            test_limits(),
        );
        let gallery = Gallery::new(storage.clone(), ledger.clone(), records.clone());

        Self {
            storage,
            ledger,
            records,
            pipeline,
            gallery,
            user,
        }
    }
}
