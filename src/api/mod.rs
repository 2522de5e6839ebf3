pub mod auth;
pub mod conversations;
pub mod employer;
pub mod guard;
pub mod jobs;
pub mod messages;
pub mod middleware;
pub mod pages;
pub mod resumes;
pub mod state;
pub mod user;

pub use middleware::AuthUser;
pub use state::AppState;

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Multipart framing allowance on top of the file size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    let public_api = Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/jobs/recent", get(jobs::recent_jobs))
        .route("/api/jobs/{job_id}/questions", get(jobs::job_questions));

    let protected_api = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/user/bootstrap", post(user::bootstrap))
        .route(
            "/api/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route(
            "/api/messages/{conversation_id}",
            get(messages::list_messages).post(messages::send_message),
        )
        .route("/api/jobs/{job_id}/applications", post(jobs::apply_to_job))
        .route("/api/employer/company", post(employer::create_company))
        .route(
            "/api/employer/jobs",
            get(employer::list_jobs).post(employer::create_job),
        )
        .route(
            "/api/employer/jobs/{job_id}/applications",
            get(employer::list_applications),
        )
        .route(
            "/api/resumes/upload",
            post(resumes::upload_resume).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let guarded_pages = Router::new()
        .route("/seeker", get(pages::guarded_page))
        .route("/seeker/{*rest}", get(pages::guarded_page))
        .route("/employer", get(pages::guarded_page))
        .route("/employer/{*rest}", get(pages::guarded_page))
        .route("/admin", get(pages::guarded_page))
        .route("/admin/{*rest}", get(pages::guarded_page))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            guard::page_guard,
        ));

    let public_pages = Router::new()
        .route(guard::LOGIN_PATH, get(pages::public_page))
        .route(guard::VERIFY_EMAIL_PATH, get(pages::public_page))
        .route(guard::FORBIDDEN_PATH, get(pages::public_page));

    Router::new()
        .merge(public_api)
        .merge(protected_api)
        .merge(guarded_pages)
        .merge(public_pages)
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
