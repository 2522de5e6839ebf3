//! Polling message sync for one conversation view.
//!
//! [`MessageSync::start`] resolves the conversation once, fetches immediately,
//! then refetches on a fixed interval until the returned [`SyncHandle`] is
//! dropped. Periodic refresh failures keep the last good snapshot.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::ClientError;
use crate::api::messages::SendMessageResponse;
use crate::db::Message;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Where messages come from and go to.
pub trait MessageSource: Send + Sync + 'static {
    /// Find or create the conversation this view is about.
    fn resolve(&self) -> impl Future<Output = Result<String, ClientError>> + Send;

    fn fetch(
        &self,
        conversation_id: &str,
    ) -> impl Future<Output = Result<Vec<Message>, ClientError>> + Send;

    fn send(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> impl Future<Output = Result<SendMessageResponse, ClientError>> + Send;
}

/// The scrollable list the messages are rendered into.
pub trait Viewport: Send + Sync + 'static {
    fn is_near_bottom(&self) -> bool;

    fn scroll_to_bottom(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Unresolved,
    Resolved { conversation_id: String },
}

#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    pub state: SyncState,
    pub messages: Vec<Message>,
    /// Set when resolution failed; periodic refresh errors never land here.
    pub error: Option<String>,
}

impl SyncSnapshot {
    pub fn conversation_id(&self) -> Option<&str> {
        match &self.state {
            SyncState::Resolved { conversation_id } => Some(conversation_id),
            SyncState::Unresolved => None,
        }
    }
}

enum Command {
    Send {
        content: String,
        reply: oneshot::Sender<Result<SendMessageResponse, ClientError>>,
    },
}

pub struct MessageSync<S, V> {
    source: Arc<S>,
    viewport: Arc<V>,
    snapshot: watch::Sender<SyncSnapshot>,
}

impl<S: MessageSource, V: Viewport> MessageSync<S, V> {
    /// Mount a sync: spawns the polling task on the current runtime.
    pub fn start(source: Arc<S>, viewport: Arc<V>, period: Duration) -> SyncHandle {
        let (snapshot_tx, snapshot_rx) = watch::channel(SyncSnapshot {
            state: SyncState::Unresolved,
            messages: Vec::new(),
            error: None,
        });
        let (command_tx, command_rx) = mpsc::channel(16);

        let sync = MessageSync {
            source,
            viewport,
            snapshot: snapshot_tx,
        };
        let task = tokio::spawn(sync.run(period, command_rx));

        SyncHandle {
            snapshot: snapshot_rx,
            commands: command_tx,
            task,
        }
    }

    async fn run(self, period: Duration, mut commands: mpsc::Receiver<Command>) {
        let conversation_id = match self.source.resolve().await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "failed to resolve conversation");
                self.snapshot.send_modify(|s| s.error = Some(e.to_string()));
                return;
            }
        };

        self.snapshot.send_modify(|s| {
            s.state = SyncState::Resolved {
                conversation_id: conversation_id.clone(),
            };
            s.error = None;
        });

        self.refresh(&conversation_id, false).await;

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh(&conversation_id, false).await;
                }
                command = commands.recv() => match command {
                    Some(Command::Send { content, reply }) => {
                        let result = self.source.send(&conversation_id, &content).await;
                        if result.is_ok() {
                            self.refresh(&conversation_id, true).await;
                        }
                        let _ = reply.send(result);
                    }
                    None => break,
                },
            }
        }

        tracing::debug!(conversation_id = %conversation_id, "message sync stopped");
    }

    /// Fetch and publish; scroll afterwards if the list was already at the bottom
    /// or the scroll is forced.
    async fn refresh(&self, conversation_id: &str, force_scroll: bool) {
        match self.source.fetch(conversation_id).await {
            Ok(messages) => {
                let follow = force_scroll || self.viewport.is_near_bottom();
                self.snapshot.send_modify(|s| s.messages = messages);
                if follow {
                    self.viewport.scroll_to_bottom();
                }
            }
            Err(e) => {
                tracing::debug!(conversation_id, error = %e, "message refresh failed; keeping last snapshot");
            }
        }
    }
}

/// Owner of a mounted sync. Dropping it cancels the polling task.
pub struct SyncHandle {
    snapshot: watch::Receiver<SyncSnapshot>,
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    pub fn snapshot(&self) -> SyncSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.snapshot.clone()
    }

    /// Append a message, then refresh immediately and scroll to the bottom.
    pub async fn send(&self, content: &str) -> Result<SendMessageResponse, ClientError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Send {
                content: content.to_string(),
                reply,
            })
            .await
            .map_err(|_| ClientError::Shared("message sync is not running".to_string()))?;

        response
            .await
            .map_err(|_| ClientError::Shared("message sync stopped before replying".to_string()))?
    }

    pub fn stop(self) {}
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
