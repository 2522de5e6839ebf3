use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::Application;
use crate::db::now_millis;
use crate::error::AppError;

pub struct ApplicationRepository;

impl ApplicationRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        job_id: &str,
        seeker_id: &str,
        resume_object: Option<&str>,
    ) -> Result<Application, AppError> {
        let application = sqlx::query_as::<_, Application>(
            r#"
INSERT INTO applications (id, job_id, seeker_id, resume_object, status, created_at)
VALUES (?, ?, ?, ?, 'submitted', ?)
RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(job_id)
        .bind(seeker_id)
        .bind(resume_object)
        .bind(now_millis())
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if AppError::is_unique_violation(&e) {
                AppError::Conflict("Already applied to this job".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(application)
    }

    pub async fn list_for_job(
        pool: &Pool<Sqlite>,
        job_id: &str,
    ) -> Result<Vec<Application>, AppError> {
        let applications = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE job_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(job_id)
        .fetch_all(pool)
        .await?;

        Ok(applications)
    }
}
