use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::db::models::Company;
use crate::db::now_millis;
use crate::error::AppError;

pub struct CompanyRepository;

impl CompanyRepository {
    pub async fn create<'e, E>(
        executor: E,
        name: &str,
        owner_id: &str,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
INSERT INTO companies (id, name, owner_id, created_at)
VALUES (?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(owner_id)
        .bind(now_millis())
        .fetch_one(executor)
        .await?;

        Ok(company)
    }
}
