//! End-to-end exercises of the upload pipeline and gallery against real disk
//! storage and the in-memory ledger and record store.

use std::sync::Arc;

use tempfile::TempDir;
use uuid::Uuid;

use linkpixel_server::{
    errors::AppError,
    models::PlanTier,
    quota::{memory::MemoryQuotaLedger, PlanLimits, QuotaLedger},
    records::{memory::MemoryImageRecords, ImageRecords},
    services::{
        gallery::Gallery,
        upload::{CandidateFile, UploadLimits, UploadPipeline},
    },
    storage::{local::LocalStorage, PublicUrls, StorageBackend},
};

struct TestApp {
    _dir: TempDir,
    upload_root: std::path::PathBuf,
    pipeline: Arc<UploadPipeline>,
    gallery: Gallery,
    ledger: Arc<MemoryQuotaLedger>,
    records: Arc<MemoryImageRecords>,
    user: Uuid,
}

async fn test_app(limit: i64) -> TestApp {
    let dir = TempDir::new().unwrap();
    let upload_root = dir.path().to_path_buf();

    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(dir.path()).unwrap());
    let ledger = Arc::new(MemoryQuotaLedger::new(PlanLimits {
        free: limit,
        pro: limit * 10,
        business: limit * 100,
    }));
    let records = Arc::new(MemoryImageRecords::new());

    let user = Uuid::new_v4();
    ledger.register(user, PlanTier::Free).await;

    let pipeline = Arc::new(UploadPipeline::new(
        storage.clone(),
        ledger.clone(),
        records.clone(),
        PublicUrls::new("http://localhost:5001", "uploads"),
        UploadLimits {
            max_file_bytes: 5 * 1024 * 1024,
            max_batch_files: 10,
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
        },
    ));
    let gallery = Gallery::new(storage, ledger.clone(), records.clone());

    TestApp {
        _dir: dir,
        upload_root,
        pipeline,
        gallery,
        ledger,
        records,
        user,
    }
}

fn jpeg(name: &str, size: usize) -> CandidateFile {
    CandidateFile {
        original_name: name.to_string(),
        mime_type: "image/jpeg".to_string(),
        bytes: vec![0xAB; size],
    }
}

#[tokio::test]
async fn upload_persists_files_and_bills_the_ledger() {
    let app = test_app(1_000_000).await;

    let created = app
        .pipeline
        .upload(app.user, vec![jpeg("sunset.jpg", 400), jpeg("beach.jpg", 250)])
        .await
        .unwrap();

    assert_eq!(created.len(), 2);
    assert_eq!(app.ledger.used(app.user).await.unwrap(), 650);

    for image in &created {
        let on_disk = app.upload_root.join(&image.file_name);
        assert!(on_disk.is_file());
        assert_eq!(std::fs::read(&on_disk).unwrap().len() as i64, image.size);
        assert_eq!(
            image.url,
            format!("http://localhost:5001/uploads/{}", image.file_name)
        );
    }
}

#[tokio::test]
async fn delete_removes_the_file_and_refunds_the_ledger() {
    let app = test_app(1_000_000).await;

    let created = app
        .pipeline
        .upload(app.user, vec![jpeg("sunset.jpg", 400)])
        .await
        .unwrap();
    let image = &created[0];
    let on_disk = app.upload_root.join(&image.file_name);
    assert!(on_disk.is_file());

    app.gallery.delete(image.id, app.user).await.unwrap();

    assert!(!on_disk.exists());
    assert_eq!(app.ledger.used(app.user).await.unwrap(), 0);
    assert!(app.records.find_by_id(image.id).await.unwrap().is_none());

    let err = app.gallery.delete(image.id, app.user).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn ledger_always_matches_the_record_set() {
    let app = test_app(1_000_000).await;

    let first = app
        .pipeline
        .upload(app.user, vec![jpeg("a.jpg", 100), jpeg("b.jpg", 200)])
        .await
        .unwrap();
    let second = app
        .pipeline
        .upload(app.user, vec![jpeg("c.jpg", 300)])
        .await
        .unwrap();

    app.gallery.delete(first[1].id, app.user).await.unwrap();

    let listed = app.gallery.list(app.user).await.unwrap();
    let total: i64 = listed.iter().map(|image| image.size).sum();
    assert_eq!(app.ledger.used(app.user).await.unwrap(), total);
    assert_eq!(total, 400);

    // Newest first: c.jpg was uploaded after a.jpg.
    assert_eq!(listed[0].id, second[0].id);
}

#[tokio::test]
async fn concurrent_uploads_cannot_jointly_exceed_the_quota() {
    let app = test_app(1000).await;

    let task_a = {
        let pipeline = app.pipeline.clone();
        let user = app.user;
        tokio::spawn(async move { pipeline.upload(user, vec![jpeg("a.jpg", 600)]).await })
    };
    let task_b = {
        let pipeline = app.pipeline.clone();
        let user = app.user;
        tokio::spawn(async move { pipeline.upload(user, vec![jpeg("b.jpg", 600)]).await })
    };

    let results = [task_a.await.unwrap(), task_b.await.unwrap()];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let quota_failures = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::QuotaExceeded(_))))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(quota_failures, 1);
    assert_eq!(app.ledger.used(app.user).await.unwrap(), 600);
    assert_eq!(app.records.list_by_user(app.user).await.unwrap().len(), 1);
}
