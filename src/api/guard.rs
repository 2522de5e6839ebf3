//! Request-level access guard for page navigations.
//!
//! This is the single authorization boundary for role-restricted pages: page
//! handlers behind it render the [`PageUser`] it attaches and never re-check.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::api::middleware::{bearer_token, cookie_token, resolve_session};
use crate::api::state::AppState;
use crate::db::{ProfileRepository, Role, UserRepository};
use crate::error::AppError;

pub const LOGIN_PATH: &str = "/login";
pub const VERIFY_EMAIL_PATH: &str = "/verify-email";
pub const FORBIDDEN_PATH: &str = "/unauthorized";

/// The viewer a guarded page is allowed to render for.
#[derive(Debug, Clone)]
pub struct PageUser {
    pub user_id: String,
    pub role: Role,
}

/// Outcome of checking a navigation against the caller's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow(Role),
    Redirect(&'static str),
}

/// Pure decision table: `profile` is the stored role and verification flag, if any.
pub fn decide(path: &str, profile: Option<(Role, bool)>) -> GuardDecision {
    let Some((role, verified)) = profile else {
        return GuardDecision::Redirect(LOGIN_PATH);
    };
    if !verified {
        return GuardDecision::Redirect(VERIFY_EMAIL_PATH);
    }
    match Role::from_path(path) {
        Some(required) if required != role => GuardDecision::Redirect(FORBIDDEN_PATH),
        _ => GuardDecision::Allow(role),
    }
}

fn request_token(request: &Request) -> Option<String> {
    let headers = request.headers();
    match bearer_token(headers) {
        Ok(token) => Some(token.to_string()),
        Err(_) => cookie_token(headers).map(str::to_string),
    }
}

async fn load_viewer(
    state: &AppState,
    token: Option<String>,
) -> Result<Option<(String, Role, bool)>, AppError> {
    let Some(token) = token else {
        return Ok(None);
    };

    let user = match resolve_session(state, &token).await {
        Ok(user) => user,
        Err(AppError::Unauthenticated(_)) => return Ok(None),
        Err(e) => return Err(e),
    };

    let Some(identity) = UserRepository::get_by_id(&state.db, &user.user_id).await? else {
        return Ok(None);
    };
    let Some(profile) = ProfileRepository::get(&state.db, &user.user_id).await? else {
        return Ok(None);
    };

    Ok(Some((user.user_id, profile.role, identity.email_verified)))
}

pub async fn page_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let token = request_token(&request);

    let viewer = match load_viewer(&state, token).await {
        Ok(viewer) => viewer,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "page guard lookup failed");
            return Redirect::to(LOGIN_PATH).into_response();
        }
    };

    let decision = decide(&path, viewer.as_ref().map(|(_, role, verified)| (*role, *verified)));
    match (decision, viewer) {
        (GuardDecision::Allow(role), Some((user_id, _, _))) => {
            request.extensions_mut().insert(PageUser { user_id, role });
            next.run(request).await
        }
        (GuardDecision::Redirect(target), _) => {
            tracing::debug!(path = %path, redirect = target, "page navigation redirected");
            Redirect::to(target).into_response()
        }
        (GuardDecision::Allow(_), None) => Redirect::to(LOGIN_PATH).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_goes_to_login() {
        assert_eq!(decide("/seeker/home", None), GuardDecision::Redirect(LOGIN_PATH));
    }

    #[test]
    fn test_unverified_goes_to_verification() {
        assert_eq!(
            decide("/seeker/home", Some((Role::Seeker, false))),
            GuardDecision::Redirect(VERIFY_EMAIL_PATH)
        );
    }

    #[test]
    fn test_role_mismatch_is_forbidden() {
        assert_eq!(
            decide("/employer/jobs", Some((Role::Seeker, true))),
            GuardDecision::Redirect(FORBIDDEN_PATH)
        );
        assert_eq!(
            decide("/employer/jobs", Some((Role::Admin, true))),
            GuardDecision::Redirect(FORBIDDEN_PATH)
        );
    }

    #[test]
    fn test_matching_role_allowed() {
        assert_eq!(
            decide("/employer/jobs", Some((Role::Employer, true))),
            GuardDecision::Allow(Role::Employer)
        );
    }
}
