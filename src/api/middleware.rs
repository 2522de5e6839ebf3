use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::api::state::AppState;
use crate::db::SessionRepository;
use crate::error::AppError;

/// Name of the cookie page navigations carry the session token in.
pub const SESSION_COOKIE: &str = "session";

/// Identity attached to the request once its bearer token validated.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub token: String,
}

/// Token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthenticated("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthenticated("Invalid Authorization format".to_string()))?;

    Ok(token)
}

/// Token from the session cookie, for browser navigations that carry no header.
pub fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Resolve a live session token to its user.
pub async fn resolve_session(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let session = SessionRepository::get_by_token(&state.db, token)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Invalid or expired session".to_string()))?;

    Ok(AuthUser {
        user_id: session.user_id,
        token: session.token,
    })
}

/// Authentication middleware - validates bearer session tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?.to_string();
    let user = resolve_session(&state, &token).await?;

    tracing::trace!(user_id = %user.user_id, "request authenticated");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
