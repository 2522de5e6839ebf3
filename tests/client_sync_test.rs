mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{spawn_app, TestApp};
use hireloop::client::{ApiClient, ApiConversation, ClientError, MessageSync, QueryCache, Viewport};
use hireloop::db::{ConversationScope, Role};

#[derive(Default)]
struct PinnedViewport {
    scrolls: AtomicUsize,
}

impl Viewport for PinnedViewport {
    fn is_near_bottom(&self) -> bool {
        true
    }

    fn scroll_to_bottom(&self) {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
    }
}

async fn serve(app: &TestApp) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn wait_for<F: Fn() -> bool>(check: F) {
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_sync_sees_counterpart_messages() {
    let app = spawn_app().await;
    let base_url = serve(&app).await;
    let seeker = app.seed_user("s@example.com", Role::Seeker, true).await;
    let employer = app.seed_user("e@example.com", Role::Employer, true).await;

    let seeker_client = ApiClient::new(&base_url, QueryCache::new()).with_token(&seeker.token);
    let employer_client = ApiClient::new(&base_url, QueryCache::new()).with_token(&employer.token);

    let source = Arc::new(ApiConversation {
        client: seeker_client.clone(),
        participant_id: employer.id.clone(),
        scope: ConversationScope::default(),
    });
    let viewport = Arc::new(PinnedViewport::default());
    let handle = MessageSync::start(source, viewport.clone(), Duration::from_millis(100));

    let mut updates = handle.subscribe();
    let conversation_id = tokio::time::timeout(
        Duration::from_secs(2),
        updates.wait_for(|s| s.conversation_id().is_some()),
    )
    .await
    .expect("conversation never resolved")
    .unwrap()
    .conversation_id()
    .unwrap()
    .to_string();

    // The counterpart resolves the same conversation from their side.
    let theirs = employer_client
        .resolve_conversation(&seeker.id, &ConversationScope::default())
        .await
        .unwrap();
    assert_eq!(theirs, conversation_id);

    employer_client
        .send_message(&conversation_id, "Thanks for applying")
        .await
        .unwrap();
    wait_for(|| handle.snapshot().messages.len() == 1).await;
    assert_eq!(handle.snapshot().messages[0].sender_id, employer.id);

    let sent = handle.send("  Happy to chat  ").await.unwrap();
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.messages.len(), 2);
    assert_eq!(snapshot.messages[1].id, sent.id);
    assert_eq!(snapshot.messages[1].content, "Happy to chat");
    assert!(viewport.scrolls.load(Ordering::SeqCst) >= 2);

    let listed = seeker_client.list_conversations().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].last_message_at, Some(sent.created_at));
}

#[tokio::test]
async fn test_sync_reports_unresolvable_conversation() {
    let app = spawn_app().await;
    let base_url = serve(&app).await;
    let seeker = app.seed_user("s@example.com", Role::Seeker, true).await;

    let client = ApiClient::new(&base_url, QueryCache::new()).with_token(&seeker.token);
    let source = Arc::new(ApiConversation {
        client,
        participant_id: seeker.id.clone(),
        scope: ConversationScope::default(),
    });
    let handle = MessageSync::start(
        source,
        Arc::new(PinnedViewport::default()),
        Duration::from_millis(100),
    );

    wait_for(|| handle.snapshot().error.is_some()).await;
    assert!(handle.snapshot().conversation_id().is_none());
}

#[tokio::test]
async fn test_client_surfaces_api_errors() {
    let app = spawn_app().await;
    let base_url = serve(&app).await;
    let seeker = app.seed_user("s@example.com", Role::Seeker, true).await;
    let client = ApiClient::new(&base_url, QueryCache::new()).with_token(&seeker.token);

    let err = client.list_messages("missing").await.unwrap_err();
    match err {
        ClientError::Shared(message) => assert!(message.contains("404")),
        ClientError::Status { status, .. } => assert_eq!(status, 404),
        other => panic!("unexpected error: {other}"),
    }

    let anonymous = ApiClient::new(&base_url, QueryCache::new());
    assert!(anonymous.recent_jobs().await.unwrap().is_empty());
    assert_eq!(anonymous.cache().len(), 1);
}
