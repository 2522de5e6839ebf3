mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::spawn_app;
use hireloop::db::{CompanyRepository, JobRepository, JobStatus, ProfileRepository, Role};

#[tokio::test]
async fn test_recent_lists_at_most_five_active_jobs() {
    let app = spawn_app().await;
    let owner = app.seed_user("owner@example.com", Role::Employer, true).await;
    let company = CompanyRepository::create(&app.state.db, "Acme", &owner.id)
        .await
        .unwrap();

    for n in 0..7 {
        JobRepository::create(
            &app.state.db,
            &company.id,
            &format!("Role {}", n),
            "",
            None,
            JobStatus::Active,
        )
        .await
        .unwrap();
    }
    JobRepository::create(&app.state.db, &company.id, "Hidden", "", None, JobStatus::Draft)
        .await
        .unwrap();

    let (status, body) = app.get("/api/jobs/recent", None).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 5);
    assert_eq!(jobs[0]["title"], "Role 6");
    assert!(jobs.iter().all(|j| j["company_name"] == "Acme"));
    assert!(jobs.iter().all(|j| j["title"] != "Hidden"));
}

#[tokio::test]
async fn test_questions_in_display_order() {
    let app = spawn_app().await;
    let owner = app.seed_user("owner@example.com", Role::Employer, true).await;
    let company = CompanyRepository::create(&app.state.db, "Acme", &owner.id)
        .await
        .unwrap();
    let job = JobRepository::create(&app.state.db, &company.id, "Dev", "", None, JobStatus::Active)
        .await
        .unwrap();
    JobRepository::add_question(&app.state.db, &job.id, "Second?", false, 2)
        .await
        .unwrap();
    JobRepository::add_question(&app.state.db, &job.id, "First?", true, 1)
        .await
        .unwrap();

    let (status, body) = app
        .get(&format!("/api/jobs/{}/questions", job.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let prompts: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["prompt"].as_str().unwrap())
        .collect();
    assert_eq!(prompts, vec!["First?", "Second?"]);
    assert_eq!(body[0]["required"], true);
}

#[tokio::test]
async fn test_question_lookup_errors() {
    let app = spawn_app().await;

    let (status, _) = app.get("/api/jobs/not-a-uuid/questions", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = format!("/api/jobs/{}/questions", Uuid::new_v4());
    let (status, _) = app.get(&missing, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_employer_without_company() {
    let app = spawn_app().await;
    let employer = app.seed_user("e@example.com", Role::Employer, true).await;

    let (status, body) = app.get("/api/employer/jobs", Some(&employer.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No company associated with this account");

    let (status, _) = app
        .post("/api/employer/jobs", Some(&employer.token), json!({ "title": "Dev" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_company_is_employer_only_and_single() {
    let app = spawn_app().await;
    let seeker = app.seed_user("s@example.com", Role::Seeker, true).await;
    let employer = app.seed_user("e@example.com", Role::Employer, true).await;

    let (status, _) = app
        .post("/api/employer/company", Some(&seeker.token), json!({ "name": "Nope" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, company) = app
        .post("/api/employer/company", Some(&employer.token), json!({ "name": " Acme " }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(company["name"], "Acme");

    let profile = ProfileRepository::get(&app.state.db, &employer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.company_id.as_deref(), company["id"].as_str());

    let (status, _) = app
        .post("/api/employer/company", Some(&employer.token), json!({ "name": "Again" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_post_apply_and_review_flow() {
    let app = spawn_app().await;
    let employer = app.seed_user("e@example.com", Role::Employer, true).await;
    let seeker = app.seed_user("s@example.com", Role::Seeker, true).await;
    let other = app.seed_user("o@example.com", Role::Employer, true).await;

    app.post("/api/employer/company", Some(&employer.token), json!({ "name": "Acme" }))
        .await;
    app.post("/api/employer/company", Some(&other.token), json!({ "name": "Rival" }))
        .await;

    let (status, job) = app
        .post(
            "/api/employer/jobs",
            Some(&employer.token),
            json!({
                "title": "Backend Engineer",
                "description": "Rust",
                "location": "Remote",
                "questions": [
                    { "prompt": "Years of Rust?", "required": true },
                    { "prompt": "Portfolio link" }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(job["status"], "active");
    let job_id = job["id"].as_str().unwrap();

    let (_, questions) = app
        .get(&format!("/api/jobs/{}/questions", job_id), None)
        .await;
    assert_eq!(questions[0]["prompt"], "Years of Rust?");
    assert_eq!(questions[1]["required"], false);

    let (_, mine) = app.get("/api/employer/jobs", Some(&employer.token)).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let apply_path = format!("/api/jobs/{}/applications", job_id);

    // Employers cannot apply, and resumes must belong to the caller.
    let (status, _) = app.post(&apply_path, Some(&employer.token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .post(
            &apply_path,
            Some(&seeker.token),
            json!({ "resumeObject": format!("{}/1_cv.pdf", employer.id) }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, application) = app
        .post(
            &apply_path,
            Some(&seeker.token),
            json!({ "resumeObject": format!("{}/1_cv.pdf", seeker.id) }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.post(&apply_path, Some(&seeker.token), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let review_path = format!("/api/employer/jobs/{}/applications", job_id);
    let (status, applications) = app.get(&review_path, Some(&employer.token)).await;
    assert_eq!(status, StatusCode::OK);
    let applications = applications.as_array().unwrap();
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0]["id"], application["id"]);
    assert_eq!(applications[0]["seeker_id"], seeker.id.as_str());

    let (status, _) = app.get(&review_path, Some(&other.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cannot_apply_to_closed_job() {
    let app = spawn_app().await;
    let owner = app.seed_user("owner@example.com", Role::Employer, true).await;
    let seeker = app.seed_user("s@example.com", Role::Seeker, true).await;
    let company = CompanyRepository::create(&app.state.db, "Acme", &owner.id)
        .await
        .unwrap();
    let job = JobRepository::create(&app.state.db, &company.id, "Old", "", None, JobStatus::Closed)
        .await
        .unwrap();

    let (status, _) = app
        .post(
            &format!("/api/jobs/{}/applications", job.id),
            Some(&seeker.token),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_question_insert_leaves_no_job() {
    let app = spawn_app().await;
    let employer = app.seed_user("e@example.com", Role::Employer, true).await;
    let (_, company) = app
        .post("/api/employer/company", Some(&employer.token), json!({ "name": "Acme" }))
        .await;

    sqlx::query("ALTER TABLE job_questions RENAME TO job_questions_gone")
        .execute(&app.state.db)
        .await
        .unwrap();

    let (status, _) = app
        .post(
            "/api/employer/jobs",
            Some(&employer.token),
            json!({ "title": "Dev", "questions": [{ "prompt": "Why?" }] }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let jobs = JobRepository::list_by_company(&app.state.db, company["id"].as_str().unwrap())
        .await
        .unwrap();
    assert!(jobs.is_empty());
}
