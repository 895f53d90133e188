use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    errors::Result, handlers::AppState, middleware::auth::AuthenticatedUser, models::Image,
};

pub async fn list_images(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Image>>> {
    let images = state.gallery.list(user.id).await?;
    Ok(Json(images))
}

pub async fn delete_image(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(image_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    state.gallery.delete(image_id, user.id).await?;
    Ok(Json(json!({ "message": "Image removed" })))
}
