use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::User;
use crate::db::now_millis;
use crate::error::AppError;

pub struct UserRepository;

impl UserRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        email: &str,
        password_hash: &[u8],
        password_salt: &[u8],
        role_claim: Option<&str>,
        email_verified: bool,
    ) -> Result<User, AppError> {
        let id = Uuid::new_v4().to_string();
        let created_at = now_millis();

        let user = sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (id, email, password_hash, password_salt, role_claim, email_verified, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(email)
        .bind(password_hash)
        .bind(password_salt)
        .bind(role_claim)
        .bind(email_verified)
        .bind(created_at)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if AppError::is_unique_violation(&e) {
                AppError::Conflict("Email is already registered".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(user)
    }

    pub async fn get_by_email(
        pool: &Pool<Sqlite>,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_id(
        pool: &Pool<Sqlite>,
        id: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn set_email_verified(
        pool: &Pool<Sqlite>,
        id: &str,
        verified: bool,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET email_verified = ? WHERE id = ?")
            .bind(verified)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}
