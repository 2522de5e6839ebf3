//! Request cache handed to [`ApiClient`](super::ApiClient) explicitly.
//!
//! Concurrent lookups of the same key share one in-flight request. Successful
//! results are kept for the TTL given per lookup; failures are never cached.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;

use super::ClientError;

type SharedFetch = Shared<BoxFuture<'static, Result<Value, String>>>;

enum Slot {
    Ready { value: Value, fetched_at: Instant },
    InFlight(SharedFetch),
}

#[derive(Clone, Default)]
pub struct QueryCache {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "QueryCache({} keys)", self.slots().len())
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return a fresh cached value, join an in-flight request, or start `fetch`.
    /// A zero `ttl` only deduplicates concurrent requests.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<Value, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>> + Send + 'static,
    {
        let pending = {
            let mut slots = self.slots();
            match slots.get(key) {
                Some(Slot::Ready { value, fetched_at }) if fetched_at.elapsed() < ttl => {
                    return Ok(value.clone());
                }
                Some(Slot::InFlight(pending)) => pending.clone(),
                _ => {
                    let pending = fetch()
                        .map(|result| result.map_err(|e| e.to_string()))
                        .boxed()
                        .shared();
                    slots.insert(key.to_string(), Slot::InFlight(pending.clone()));
                    pending
                }
            }
        };

        let result = pending.clone().await;

        let mut slots = self.slots();
        // Settle only our own request; after an invalidation the slot is empty
        // or belongs to a newer request.
        let current = matches!(
            slots.get(key),
            Some(Slot::InFlight(in_flight)) if in_flight.ptr_eq(&pending)
        );
        if current {
            match &result {
                Ok(value) => {
                    slots.insert(
                        key.to_string(),
                        Slot::Ready {
                            value: value.clone(),
                            fetched_at: Instant::now(),
                        },
                    );
                }
                Err(_) => {
                    slots.remove(key);
                }
            }
        }

        result.map_err(ClientError::Shared)
    }

    pub fn invalidate(&self, key: &str) {
        self.slots().remove(key);
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
