use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;

use crate::{
    auth::{JwtService, PasswordService},
    errors::{AppError, Result},
    handlers::AppState,
    middleware::auth::AuthenticatedUser,
    models::{AuthResponse, CreateUserRequest, LoginRequest, UsageResponse, UserResponse},
};

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if !request.email.contains('@') {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }
    PasswordService::validate_password_strength(&request.password)?;

    if state
        .db
        .find_user_by_email(&request.email)
        .await?
        .is_some()
    {
        return Err(AppError::Validation(
            "User with this email already exists".to_string(),
        ));
    }

    let password_hash = PasswordService::hash_password(&request.password)?;
    let user = state
        .db
        .create_user(request.name.trim(), &request.email, &password_hash)
        .await?;

    let token = JwtService::new(&state.config.jwt_secret).generate_token(user.id, &user.email)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserResponse::from(user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = state
        .db
        .find_user_by_email(&request.email)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid email or password".to_string()))?;

    if !PasswordService::verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::Auth("Invalid email or password".to_string()));
    }

    let token = JwtService::new(&state.config.jwt_secret).generate_token(user.id, &user.email)?;

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(user),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<serde_json::Value>> {
    let user = state
        .db
        .find_user_by_id(auth.id)
        .await?
        .ok_or(AppError::NotFound)?;

    let quota = state.config.plan_limits().limit_for(user.plan);
    let usage = UsageResponse {
        quota_bytes: quota,
        used_bytes: user.storage_used,
        remaining_bytes: (quota - user.storage_used).max(0),
    };

    Ok(Json(json!({
        "user": UserResponse::from(user),
        "usage": usage
    })))
}
