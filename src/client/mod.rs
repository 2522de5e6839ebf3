//! HTTP client for the marketplace API and the message polling sync built on it.

pub mod cache;
pub mod sync;

pub use cache::QueryCache;
pub use sync::{MessageSource, MessageSync, SyncHandle, SyncSnapshot, SyncState, Viewport};

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::api::auth::LoginResponse;
use crate::api::conversations::ConversationIdResponse;
use crate::api::messages::SendMessageResponse;
use crate::db::{Conversation, ConversationScope, JobListing, Message};

/// How long listing endpoints stay cached on the client.
const LISTING_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Not logged in")]
    NotAuthenticated,

    /// A failure observed through a shared (deduplicated) request.
    #[error("{0}")]
    Shared(String),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    cache: QueryCache,
}

impl ApiClient {
    /// `cache` is shared by every clone of this client; pass a fresh one for isolation.
    pub fn new(base_url: impl Into<String>, cache: QueryCache) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            cache,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    async fn request(
        http: reqwest::Client,
        method: Method,
        url: String,
        token: Option<String>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), ClientError> {
        let mut builder = http.request(method, &url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        if !status.is_success() {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
                .to_string();
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok((status, value))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let (_, value) =
            Self::request(self.http.clone(), method, url, self.token.clone(), body).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn cached_get<T: DeserializeOwned>(
        &self,
        key: &str,
        path: &str,
        ttl: Duration,
    ) -> Result<T, ClientError> {
        let http = self.http.clone();
        let url = format!("{}{}", self.base_url, path);
        let token = self.token.clone();

        let value = self
            .cache
            .get_or_fetch(key, ttl, move || async move {
                Self::request(http, Method::GET, url, token, None)
                    .await
                    .map(|(_, value)| value)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    fn require_token(&self) -> Result<(), ClientError> {
        if self.token.is_none() {
            return Err(ClientError::NotAuthenticated);
        }
        Ok(())
    }

    /// Log in and return a client carrying the new session token.
    pub async fn login(self, email: &str, password: &str) -> Result<Self, ClientError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response: LoginResponse = self.call(Method::POST, "/api/auth/login", Some(body)).await?;
        Ok(self.with_token(response.session_token))
    }

    pub async fn recent_jobs(&self) -> Result<Vec<JobListing>, ClientError> {
        self.cached_get("jobs:recent", "/api/jobs/recent", LISTING_TTL)
            .await
    }

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, ClientError> {
        self.require_token()?;
        self.cached_get("conversations", "/api/conversations", LISTING_TTL)
            .await
    }

    pub async fn resolve_conversation(
        &self,
        participant_id: &str,
        scope: &ConversationScope,
    ) -> Result<String, ClientError> {
        self.require_token()?;
        let body = serde_json::json!({
            "participantId": participant_id,
            "jobId": scope.job_id,
            "applicationId": scope.application_id,
        });
        let response: ConversationIdResponse =
            self.call(Method::POST, "/api/conversations", Some(body)).await?;
        self.cache.invalidate("conversations");
        Ok(response.id)
    }

    /// Always hits the server; concurrent calls for one conversation share a request.
    pub async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ClientError> {
        self.require_token()?;
        let key = format!("messages:{}", conversation_id);
        let path = format!("/api/messages/{}", conversation_id);
        self.cached_get(&key, &path, Duration::ZERO).await
    }

    pub async fn send_message(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> Result<SendMessageResponse, ClientError> {
        self.require_token()?;
        let body = serde_json::json!({ "content": content });
        let path = format!("/api/messages/{}", conversation_id);
        let response = self.call(Method::POST, &path, Some(body)).await?;
        self.cache.invalidate(&format!("messages:{}", conversation_id));
        self.cache.invalidate("conversations");
        Ok(response)
    }
}

/// A conversation with one counterpart, resolved through the API on first use.
#[derive(Debug, Clone)]
pub struct ApiConversation {
    pub client: ApiClient,
    pub participant_id: String,
    pub scope: ConversationScope,
}

impl MessageSource for ApiConversation {
    async fn resolve(&self) -> Result<String, ClientError> {
        self.client
            .resolve_conversation(&self.participant_id, &self.scope)
            .await
    }

    async fn fetch(&self, conversation_id: &str) -> Result<Vec<Message>, ClientError> {
        self.client.list_messages(conversation_id).await
    }

    async fn send(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> Result<SendMessageResponse, ClientError> {
        self.client.send_message(conversation_id, content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:8080/", QueryCache::new());
        assert_eq!(client.base_url, "http://localhost:8080");
        assert!(client.token().is_none());
    }

    #[tokio::test]
    async fn test_authenticated_calls_require_token() {
        let client = ApiClient::new("http://localhost:1", QueryCache::new());
        let err = client.list_messages("c1").await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }
}
