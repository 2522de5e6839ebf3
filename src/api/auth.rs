use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::crypto::{generate_salt, hash_password, validate_password, verify_password};
use crate::db::{Role, SessionRepository, UserRepository};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub user_id: String,
    pub email_verified: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub session_token: String,
    pub expires_at: i64,
}

/// Validate and normalize an email address
fn validate_email(email: &str) -> Result<String, AppError> {
    let trimmed = email.trim();

    let valid = trimmed.len() <= 254
        && trimmed
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
        && !trimmed.chars().any(char::is_whitespace);

    if !valid {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    Ok(trimmed.to_lowercase())
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let email = validate_email(&req.email)?;
    validate_password(&req.password)?;
    let role: Role = req.role.parse().map_err(AppError::Validation)?;

    let salt = generate_salt();
    let password_hash = hash_password(&req.password, &salt)?;

    let verified = state.config.auto_verify_signups;
    let user = UserRepository::create(
        &state.db,
        &email,
        &password_hash,
        &salt,
        Some(role.as_str()),
        verified,
    )
    .await?;

    tracing::info!(user_id = %user.id, role = %role, "identity created");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id,
            email_verified: user.email_verified,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let invalid = || AppError::Unauthenticated("Invalid credentials".to_string());

    let email = validate_email(&req.email).map_err(|_| invalid())?;
    let user = UserRepository::get_by_email(&state.db, &email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password_hash, &user.password_salt)? {
        return Err(invalid());
    }

    let session =
        SessionRepository::create(&state.db, &user.id, state.config.session_expiry_hours).await?;

    tracing::debug!(user_id = %user.id, "session established");

    Ok(Json(LoginResponse {
        session_token: session.token,
        expires_at: session.expires_at,
    }))
}

/// POST /api/auth/logout (requires auth)
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    SessionRepository::delete(&state.db, &user.token).await?;

    tracing::debug!(user_id = %user.user_id, "session destroyed");

    Ok(Json(serde_json::json!({"success": true})))
}
