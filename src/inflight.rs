//! Per-key in-flight work
//!
//! At most one task runs per key. The task is spawned, so it finishes even
//! when every caller waiting on it goes away. Later callers for the same key
//! join the running task and observe its output. The key is released inside
//! the task, before its output becomes visible to any waiter.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::warn;

/// Output of a spawned task; `None` if the task panicked or was cancelled
pub type Pending<V> = Shared<BoxFuture<'static, Option<V>>>;

type Slots<V> = Arc<Mutex<HashMap<String, Pending<V>>>>;

/// Removes the key once the task's future is dropped, however it ends
struct DoneToken<V> {
    key: String,
    slots: Slots<V>,
}

impl<V> Drop for DoneToken<V> {
    fn drop(&mut self) {
        self.slots.lock().unwrap().remove(&self.key);
    }
}

pub struct Inflight<V> {
    slots: Slots<V>,
}

impl<V> Clone for Inflight<V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<V> Default for Inflight<V> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> Inflight<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.lock().unwrap().contains_key(key)
    }

    /// The running task for `key`, if any
    pub fn get(&self, key: &str) -> Option<Pending<V>> {
        self.slots.lock().unwrap().get(key).cloned()
    }

    /// Join the task running for `key`, or spawn `start()` as that task
    ///
    /// The flag is `true` when an existing task was joined; `start` is not
    /// called in that case.
    pub fn join_or_spawn<F, Fut>(&self, key: &str, start: F) -> (Pending<V>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let mut slots = self.slots.lock().unwrap();
        if let Some(existing) = slots.get(key) {
            return (existing.clone(), true);
        }

        let done_token = DoneToken {
            key: key.to_string(),
            slots: self.slots.clone(),
        };
        let work = start();
        // the token cannot remove the key before it is inserted: removal
        // needs the lock held here
        let handle = tokio::spawn(async move {
            let _done_token = done_token;
            work.await
        });

        let owned_key = key.to_string();
        let pending = async move {
            match handle.await {
                Ok(value) => Some(value),
                Err(error) => {
                    warn!(key = %owned_key, error = %error, "In-flight task did not complete");
                    None
                }
            }
        }
        .boxed()
        .shared();

        slots.insert(key.to_string(), pending.clone());
        (pending, false)
    }
}
