use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::api::jobs::parse_job_id;
use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::db::{
    Application, ApplicationRepository, Company, CompanyRepository, Job, JobRepository, JobStatus,
    Profile, ProfileRepository, Role,
};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionInput {
    pub prompt: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: Option<String>,
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub questions: Vec<QuestionInput>,
}

async fn employer_profile(state: &AppState, user_id: &str) -> Result<Profile, AppError> {
    let profile = ProfileRepository::get(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Validation("Profile not initialised".to_string()))?;
    if profile.role != Role::Employer {
        return Err(AppError::Validation("Employer account required".to_string()));
    }
    Ok(profile)
}

/// The caller's company id; accounts without one are a 400.
async fn company_id(state: &AppState, user_id: &str) -> Result<String, AppError> {
    ProfileRepository::get(&state.db, user_id)
        .await?
        .and_then(|profile| profile.company_id)
        .ok_or_else(|| AppError::Validation("No company associated with this account".to_string()))
}

/// POST /api/employer/company (requires auth, employers only)
pub async fn create_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    let profile = employer_profile(&state, &auth.user_id).await?;
    if profile.company_id.is_some() {
        return Err(AppError::Conflict("Account already has a company".to_string()));
    }

    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Company name is required".to_string()));
    }

    let mut tx = state.db.begin().await?;
    let company = CompanyRepository::create(&mut *tx, name, &auth.user_id).await?;
    // A concurrent request may have linked a company since the check above.
    if !ProfileRepository::set_company(&mut *tx, &auth.user_id, &company.id).await? {
        return Err(AppError::Conflict("Account already has a company".to_string()));
    }
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(company)))
}

/// GET /api/employer/jobs (requires auth)
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<Job>>, AppError> {
    let company_id = company_id(&state, &auth.user_id).await?;
    let jobs = JobRepository::list_by_company(&state.db, &company_id).await?;
    Ok(Json(jobs))
}

/// POST /api/employer/jobs (requires auth)
pub async fn create_job(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let company_id = company_id(&state, &auth.user_id).await?;

    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Job title is required".to_string()));
    }
    if req.questions.iter().any(|q| q.prompt.trim().is_empty()) {
        return Err(AppError::Validation("Question prompts cannot be empty".to_string()));
    }

    let mut tx = state.db.begin().await?;
    let job = JobRepository::create(
        &mut *tx,
        &company_id,
        title,
        req.description.trim(),
        req.location.as_deref().map(str::trim).filter(|l| !l.is_empty()),
        req.status.unwrap_or(JobStatus::Active),
    )
    .await?;

    for (order, question) in req.questions.iter().enumerate() {
        JobRepository::add_question(
            &mut *tx,
            &job.id,
            question.prompt.trim(),
            question.required,
            order as i64,
        )
        .await?;
    }

    tx.commit().await?;

    tracing::info!(job_id = %job.id, company_id = %company_id, "job posted");

    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/employer/jobs/{job_id}/applications (requires auth)
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<Application>>, AppError> {
    let job_id = parse_job_id(&raw_id)?;
    let company_id = company_id(&state, &auth.user_id).await?;

    let job = JobRepository::get_by_id(&state.db, &job_id)
        .await?
        .filter(|job| job.company_id == company_id)
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let applications = ApplicationRepository::list_for_job(&state.db, &job.id).await?;
    Ok(Json(applications))
}
