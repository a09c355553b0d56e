//! Latest-only tracking for list queries that get re-issued.
//!
//! Re-running a key aborts the previous task for that key; a response that
//! arrives after a newer request for the same key is reported as
//! [`ClientError::Stale`] and must not be applied.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::task::AbortHandle;

use crate::error::{ClientError, ClientResult};
use crate::{joined, lock};

#[derive(Debug, Default)]
struct Inner {
    next_generation: u64,
    /// Newest generation issued per key; kept after completion.
    latest: HashMap<String, u64>,
    pending: HashMap<String, (u64, AbortHandle)>,
    /// Generations up to this one were cancelled by `cancel_all`.
    cancelled_through: u64,
}

#[derive(Debug, Clone, Default)]
pub struct LatestRequests {
    inner: Arc<Mutex<Inner>>,
}

impl LatestRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `request` as the current request for `key`.
    ///
    /// Returns `Stale` if a newer request for `key` started before this one
    /// finished, `Cancelled` if [`cancel_all`](Self::cancel_all) ran.
    pub async fn run<T, F>(&self, key: impl Into<String>, request: F) -> ClientResult<T>
    where
        T: Send + 'static,
        F: Future<Output = ClientResult<T>> + Send + 'static,
    {
        let key = key.into();
        let task = tokio::spawn(request);
        let generation = {
            let mut inner = lock(&self.inner);
            inner.next_generation += 1;
            let generation = inner.next_generation;
            inner.latest.insert(key.clone(), generation);
            if let Some((_, previous)) = inner
                .pending
                .insert(key.clone(), (generation, task.abort_handle()))
            {
                tracing::debug!(key = %key, "superseding in-flight request");
                previous.abort();
            }
            generation
        };

        let pending = PendingTask {
            inner: &self.inner,
            key: &key,
            generation,
            abort: task.abort_handle(),
        };
        let outcome = task.await;
        drop(pending);

        {
            let inner = lock(&self.inner);
            if inner.latest.get(&key) != Some(&generation) {
                tracing::debug!(key = %key, "discarding stale response");
                return Err(ClientError::Stale);
            }
            if generation <= inner.cancelled_through {
                return Err(ClientError::Cancelled);
            }
        }

        joined(outcome)
    }

    pub fn is_pending(&self, key: &str) -> bool {
        lock(&self.inner).pending.contains_key(key)
    }

    /// Abort everything in flight; waiting callers get `Cancelled`.
    pub fn cancel_all(&self) {
        let pending: Vec<(String, (u64, AbortHandle))> = {
            let mut inner = lock(&self.inner);
            inner.cancelled_through = inner.next_generation;
            inner.pending.drain().collect()
        };
        for (key, (_, abort)) in pending {
            tracing::debug!(key = %key, "cancelling in-flight request");
            abort.abort();
        }
    }
}

/// Unregisters a request once its caller stops waiting, and aborts the task
/// if it is still running.
struct PendingTask<'a> {
    inner: &'a Mutex<Inner>,
    key: &'a str,
    generation: u64,
    abort: AbortHandle,
}

impl Drop for PendingTask<'_> {
    fn drop(&mut self) {
        {
            let mut inner = lock(self.inner);
            if inner
                .pending
                .get(self.key)
                .is_some_and(|(generation, _)| *generation == self.generation)
            {
                inner.pending.remove(self.key);
            }
        }
        self.abort.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn newer_request_wins() {
        let latest = LatestRequests::new();
        let (release_first, first_gate) = oneshot::channel::<()>();

        let first = {
            let latest = latest.clone();
            tokio::spawn(async move {
                latest
                    .run("tickets", async move {
                        let _ = first_gate.await;
                        Ok::<_, ClientError>("old")
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        while !latest.is_pending("tickets") {
            tokio::task::yield_now().await;
        }

        let second = latest.run("tickets", async { Ok::<_, ClientError>("new") }).await;
        assert_eq!(second, Ok("new"));
        let _ = release_first.send(());
        assert_eq!(first.await.unwrap(), Err(ClientError::Stale));
        assert!(!latest.is_pending("tickets"));
    }

    #[tokio::test]
    async fn cancel_all_reports_cancelled() {
        let latest = LatestRequests::new();
        let pending = {
            let latest = latest.clone();
            tokio::spawn(async move {
                latest
                    .run("zones", std::future::pending::<ClientResult<()>>())
                    .await
            })
        };
        while !latest.is_pending("zones") {
            tokio::task::yield_now().await;
        }
        latest.cancel_all();
        assert_eq!(pending.await.unwrap(), Err(ClientError::Cancelled));
    }

    #[tokio::test]
    async fn dropped_caller_aborts_its_request() {
        let latest = LatestRequests::new();
        let (alive, gone) = oneshot::channel::<()>();
        let caller = {
            let latest = latest.clone();
            tokio::spawn(async move {
                latest
                    .run("items", async move {
                        let _alive = alive;
                        std::future::pending::<ClientResult<()>>().await
                    })
                    .await
            })
        };
        while !latest.is_pending("items") {
            tokio::task::yield_now().await;
        }

        caller.abort();
        assert!(gone.await.is_err());
        assert!(!latest.is_pending("items"));
    }

    #[tokio::test]
    async fn independent_keys_do_not_interfere() {
        let latest = LatestRequests::new();
        let a = latest.run("a", async { Ok::<_, ClientError>(1) });
        let b = latest.run("b", async { Ok::<_, ClientError>(2) });
        let (a, b) = tokio::join!(a, b);
        assert_eq!((a, b), (Ok(1), Ok(2)));
    }
}
