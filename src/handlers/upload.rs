use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};

use crate::{
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::Image,
    services::upload::CandidateFile,
};

/// Accepts a multipart batch and runs it through the upload pipeline.
///
/// The pipeline runs on a spawned task: a client that disconnects mid-request
/// cannot cancel the future between the quota reservation and its
/// commit/rollback, so reservations are never leaked.
pub async fn upload_images(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<Image>>)> {
    let mut batch = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to parse multipart data: {}", e)))?
    {
        // Fields without a filename are form text, not uploads.
        let original_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        let mime_type = field.content_type().map(|s| s.to_string()).ok_or_else(|| {
            AppError::Validation(format!("'{}' is missing a MIME type", original_name))
        })?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read '{}': {}", original_name, e)))?
            .to_vec();

        batch.push(CandidateFile {
            original_name,
            mime_type,
            bytes,
        });
    }

    let pipeline = state.pipeline.clone();
    let user_id = user.id;
    let created = tokio::spawn(async move { pipeline.upload(user_id, batch).await })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Upload task failed: {}", e)))??;

    Ok((StatusCode::CREATED, Json(created)))
}
