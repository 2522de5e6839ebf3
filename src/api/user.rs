use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::{ProfileRepository, Role, UserRepository};
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct BootstrapResponse {
    pub ok: bool,
    pub role: Role,
    pub company_id: Option<String>,
}

fn claimed_role(claim: Option<&str>) -> Result<Role, AppError> {
    claim
        .ok_or_else(|| AppError::Validation("Account has no role claim".to_string()))?
        .parse()
        .map_err(AppError::Validation)
}

/// POST /api/user/bootstrap (requires auth)
///
/// Makes sure the caller has a profile row and reports its role. A missing
/// profile is created from the identity's role claim. If the profile lookup
/// itself fails, the claim is reported instead when claim fallback is enabled.
pub async fn bootstrap(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<BootstrapResponse>, AppError> {
    let identity = UserRepository::get_by_id(&state.db, &auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Unknown account".to_string()))?;

    let response = match ProfileRepository::get(&state.db, &identity.id).await {
        Ok(Some(profile)) => BootstrapResponse {
            ok: true,
            role: profile.role,
            company_id: profile.company_id,
        },
        Ok(None) => {
            let role = claimed_role(identity.role_claim.as_deref())?;
            let profile =
                ProfileRepository::ensure(&state.db, &identity.id, &identity.email, None, role)
                    .await?;
            tracing::info!(user_id = %identity.id, role = %profile.role, "profile created on bootstrap");
            BootstrapResponse {
                ok: true,
                role: profile.role,
                company_id: profile.company_id,
            }
        }
        Err(e) if state.config.allow_claim_fallback => {
            let role = claimed_role(identity.role_claim.as_deref()).map_err(|_| e)?;
            tracing::warn!(
                user_id = %identity.id,
                role = %role,
                "profile lookup failed; answering with the identity's role claim"
            );
            BootstrapResponse {
                ok: true,
                role,
                company_id: None,
            }
        }
        Err(e) => return Err(e),
    };

    Ok(Json(response))
}
