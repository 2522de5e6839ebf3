use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::{
    ApplicationRepository, JobListing, JobQuestion, JobRepository, JobStatus, ProfileRepository,
    Role,
};
use crate::error::AppError;

pub const RECENT_JOBS_LIMIT: i64 = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub resume_object: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApplicationIdResponse {
    pub id: String,
}

/// Job ids are UUIDs; anything else is a malformed request rather than a miss.
pub fn parse_job_id(raw: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| AppError::Validation("Invalid job id".to_string()))
}

/// GET /api/jobs/recent (public)
pub async fn recent_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobListing>>, AppError> {
    let jobs = JobRepository::recent_active(&state.db, RECENT_JOBS_LIMIT).await?;
    Ok(Json(jobs))
}

/// GET /api/jobs/{job_id}/questions (public)
pub async fn job_questions(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<JobQuestion>>, AppError> {
    let job_id = parse_job_id(&raw_id)?;

    JobRepository::get_by_id(&state.db, &job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let questions = JobRepository::list_questions(&state.db, &job_id).await?;
    Ok(Json(questions))
}

/// POST /api/jobs/{job_id}/applications (requires auth, seekers only)
pub async fn apply_to_job(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplicationIdResponse>), AppError> {
    let job_id = parse_job_id(&raw_id)?;

    let profile = ProfileRepository::get(&state.db, &auth.user_id)
        .await?
        .ok_or_else(|| AppError::Validation("Profile not initialised".to_string()))?;
    if profile.role != Role::Seeker {
        return Err(AppError::Validation("Only job seekers can apply".to_string()));
    }

    let job = JobRepository::get_by_id(&state.db, &job_id)
        .await?
        .filter(|job| job.status == JobStatus::Active)
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let resume = req
        .resume_object
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());
    if let Some(resume) = resume {
        let owned_prefix = format!("{}/", auth.user_id);
        if !resume.starts_with(&owned_prefix) {
            return Err(AppError::Validation("Resume does not belong to caller".to_string()));
        }
    }

    let application =
        ApplicationRepository::create(&state.db, &job.id, &auth.user_id, resume).await?;

    tracing::info!(application_id = %application.id, job_id = %job.id, "application submitted");

    Ok((
        StatusCode::CREATED,
        Json(ApplicationIdResponse { id: application.id }),
    ))
}
