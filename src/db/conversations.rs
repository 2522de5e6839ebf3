use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::Conversation;
use crate::db::now_millis;
use crate::error::AppError;

/// Optional job/application keys a conversation is scoped to. `None` only matches `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationScope {
    pub job_id: Option<String>,
    pub application_id: Option<String>,
}

/// Participants are stored lowest id first so the pair is order-independent.
pub fn normalize_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

pub struct ConversationRepository;

impl ConversationRepository {
    pub async fn find(
        pool: &Pool<Sqlite>,
        a: &str,
        b: &str,
        scope: &ConversationScope,
    ) -> Result<Option<Conversation>, AppError> {
        let (one, two) = normalize_pair(a, b);

        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
SELECT * FROM conversations
WHERE participant_one = ? AND participant_two = ?
  AND job_id IS ? AND application_id IS ?
LIMIT 1
            "#,
        )
        .bind(one)
        .bind(two)
        .bind(scope.job_id.as_deref())
        .bind(scope.application_id.as_deref())
        .fetch_optional(pool)
        .await?;

        Ok(conversation)
    }

    /// Returns `None` when the pair/scope unique index suppressed the insert.
    pub async fn insert_if_absent(
        pool: &Pool<Sqlite>,
        a: &str,
        b: &str,
        scope: &ConversationScope,
    ) -> Result<Option<Conversation>, AppError> {
        let (one, two) = normalize_pair(a, b);

        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
INSERT INTO conversations (id, participant_one, participant_two, job_id, application_id, last_message_at, created_at)
VALUES (?, ?, ?, ?, ?, NULL, ?)
ON CONFLICT DO NOTHING
RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(one)
        .bind(two)
        .bind(scope.job_id.as_deref())
        .bind(scope.application_id.as_deref())
        .bind(now_millis())
        .fetch_optional(pool)
        .await?;

        Ok(conversation)
    }

    /// Find the conversation for this pair and scope, creating it if needed.
    /// The flag is true when this call inserted the row.
    pub async fn find_or_create(
        pool: &Pool<Sqlite>,
        a: &str,
        b: &str,
        scope: &ConversationScope,
    ) -> Result<(Conversation, bool), AppError> {
        if let Some(existing) = Self::find(pool, a, b, scope).await? {
            return Ok((existing, false));
        }

        if let Some(created) = Self::insert_if_absent(pool, a, b, scope).await? {
            return Ok((created, true));
        }

        // Lost the race to a concurrent insert
        tracing::debug!(a, b, "conversation insert suppressed by unique index, re-fetching");
        let existing = Self::find(pool, a, b, scope).await?.ok_or_else(|| {
            AppError::Internal("Conversation conflicted but could not be re-read".to_string())
        })?;
        Ok((existing, false))
    }

    /// Row-level policy: only participants can see a conversation.
    pub async fn get_visible(
        pool: &Pool<Sqlite>,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Conversation>, AppError> {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
SELECT * FROM conversations
WHERE id = ? AND (participant_one = ? OR participant_two = ?)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(conversation)
    }

    pub async fn list_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<Conversation>, AppError> {
        let conversations = sqlx::query_as::<_, Conversation>(
            r#"
SELECT * FROM conversations
WHERE participant_one = ? OR participant_two = ?
ORDER BY last_message_at IS NULL, last_message_at DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(conversations)
    }

    pub async fn touch(pool: &Pool<Sqlite>, id: &str, at: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE conversations SET last_message_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn test_normalize_pair_is_order_independent() {
        assert_eq!(normalize_pair("u2", "u1"), ("u1", "u2"));
        assert_eq!(normalize_pair("u1", "u2"), ("u1", "u2"));
    }

    #[tokio::test]
    async fn test_find_or_create_matches_scope_exactly() {
        let pool = test_pool().await;
        let scoped = ConversationScope {
            job_id: Some("job-1".to_string()),
            application_id: None,
        };

        let (first, created) =
            ConversationRepository::find_or_create(&pool, "u2", "u1", &ConversationScope::default())
                .await
                .unwrap();
        assert!(created);
        assert_eq!(first.participant_one, "u1");

        let (again, created) =
            ConversationRepository::find_or_create(&pool, "u1", "u2", &ConversationScope::default())
                .await
                .unwrap();
        assert!(!created);
        assert_eq!(again.id, first.id);

        let (other, created) = ConversationRepository::find_or_create(&pool, "u1", "u2", &scoped)
            .await
            .unwrap();
        assert!(created);
        assert_ne!(other.id, first.id);
    }

    #[tokio::test]
    async fn test_suppressed_insert_returns_none() {
        let pool = test_pool().await;
        let scope = ConversationScope::default();

        assert!(ConversationRepository::insert_if_absent(&pool, "a", "b", &scope)
            .await
            .unwrap()
            .is_some());
        assert!(ConversationRepository::insert_if_absent(&pool, "b", "a", &scope)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_visibility_is_limited_to_participants() {
        let pool = test_pool().await;
        let (conversation, _) =
            ConversationRepository::find_or_create(&pool, "a", "b", &ConversationScope::default())
                .await
                .unwrap();

        assert!(ConversationRepository::get_visible(&pool, &conversation.id, "b")
            .await
            .unwrap()
            .is_some());
        assert!(ConversationRepository::get_visible(&pool, &conversation.id, "c")
            .await
            .unwrap()
            .is_none());
    }
}
