use axum::response::Json;
use serde_json::json;

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "LinkPixel API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
