use sqlx::{Executor, Pool, Sqlite};

use crate::db::models::{Profile, Role};
use crate::db::now_millis;
use crate::error::AppError;

pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn get(pool: &Pool<Sqlite>, user_id: &str) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(profile)
    }

    /// Insert the profile unless one already exists, then return whichever row is stored.
    pub async fn ensure(
        pool: &Pool<Sqlite>,
        user_id: &str,
        email: &str,
        full_name: Option<&str>,
        role: Role,
    ) -> Result<Profile, AppError> {
        let now = now_millis();

        sqlx::query(
            r#"
INSERT INTO profiles (id, email, full_name, role, company_id, created_at, updated_at)
VALUES (?, ?, ?, ?, NULL, ?, ?)
ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(full_name)
        .bind(role)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Self::get(pool, user_id)
            .await?
            .ok_or_else(|| AppError::Internal("Profile missing after insert".to_string()))
    }

    /// Link a company to a profile that has none yet. Returns false when the
    /// profile is missing or already linked.
    pub async fn set_company<'e, E>(
        executor: E,
        user_id: &str,
        company_id: &str,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE profiles SET company_id = ?, updated_at = ? WHERE id = ? AND company_id IS NULL",
        )
        .bind(company_id)
        .bind(now_millis())
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
