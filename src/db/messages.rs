use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::Message;
use crate::db::now_millis;
use crate::error::AppError;

pub struct MessageRepository;

impl MessageRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<Message, AppError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
INSERT INTO messages (id, conversation_id, sender_id, content, created_at, read)
VALUES (?, ?, ?, ?, ?, 0)
RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .bind(now_millis())
        .fetch_one(pool)
        .await?;

        Ok(message)
    }

    /// Oldest first; messages sharing a millisecond keep insertion order.
    pub async fn list_for_conversation(
        pool: &Pool<Sqlite>,
        conversation_id: &str,
    ) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
SELECT id, conversation_id, sender_id, content, created_at, read
FROM messages
WHERE conversation_id = ?
ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    pub async fn count_for_conversation(
        pool: &Pool<Sqlite>,
        conversation_id: &str,
    ) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
                .bind(conversation_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
