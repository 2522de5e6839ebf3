use sqlx::{Executor, Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::{Job, JobListing, JobQuestion, JobStatus};
use crate::db::now_millis;
use crate::error::AppError;

pub struct JobRepository;

impl JobRepository {
    pub async fn create<'e, E>(
        executor: E,
        company_id: &str,
        title: &str,
        description: &str,
        location: Option<&str>,
        status: JobStatus,
    ) -> Result<Job, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let job = sqlx::query_as::<_, Job>(
            r#"
INSERT INTO jobs (id, company_id, title, description, location, status, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(company_id)
        .bind(title)
        .bind(description)
        .bind(location)
        .bind(status)
        .bind(now_millis())
        .fetch_one(executor)
        .await?;

        Ok(job)
    }

    pub async fn get_by_id(pool: &Pool<Sqlite>, id: &str) -> Result<Option<Job>, AppError> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(job)
    }

    /// Active postings, newest first.
    pub async fn recent_active(
        pool: &Pool<Sqlite>,
        limit: i64,
    ) -> Result<Vec<JobListing>, AppError> {
        let jobs = sqlx::query_as::<_, JobListing>(
            r#"
SELECT j.id, j.title, j.location, j.company_id, c.name AS company_name, j.created_at
FROM jobs j
JOIN companies c ON j.company_id = c.id
WHERE j.status = 'active'
ORDER BY j.created_at DESC, j.rowid DESC
LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(jobs)
    }

    pub async fn list_by_company(
        pool: &Pool<Sqlite>,
        company_id: &str,
    ) -> Result<Vec<Job>, AppError> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE company_id = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(company_id)
        .fetch_all(pool)
        .await?;

        Ok(jobs)
    }

    pub async fn add_question<'e, E>(
        executor: E,
        job_id: &str,
        prompt: &str,
        required: bool,
        display_order: i64,
    ) -> Result<JobQuestion, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let question = sqlx::query_as::<_, JobQuestion>(
            r#"
INSERT INTO job_questions (id, job_id, prompt, required, display_order)
VALUES (?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(job_id)
        .bind(prompt)
        .bind(required)
        .bind(display_order)
        .fetch_one(executor)
        .await?;

        Ok(question)
    }

    pub async fn list_questions(
        pool: &Pool<Sqlite>,
        job_id: &str,
    ) -> Result<Vec<JobQuestion>, AppError> {
        let questions = sqlx::query_as::<_, JobQuestion>(
            r#"
SELECT id, job_id, prompt, required, display_order
FROM job_questions
WHERE job_id = ?
ORDER BY display_order ASC, rowid ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(pool)
        .await?;

        Ok(questions)
    }
}
