//! Module teardown coordination.
//!
//! Modules register async teardown hooks at construction time. The terminate
//! command runs every hook concurrently and waits for all of them before the
//! process exits. The wait is bounded: a hook that never settles is abandoned
//! with a warning after the configured teardown timeout instead of blocking
//! exit forever.

use futures_util::future;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{info, warn};

type TeardownFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type TeardownFn = Box<dyn FnOnce() -> TeardownFuture + Send>;

/// Collects per-module teardown hooks and runs them on shutdown.
pub struct Lifecycle {
    hooks: Mutex<Vec<(&'static str, TeardownFn)>>,
    timeout: Duration,
}

impl Lifecycle {
    pub fn new(timeout: Duration) -> Self {
        Self {
            hooks: Mutex::new(Vec::new()),
            timeout,
        }
    }

    /// Register a teardown hook. A module may register more than one,
    /// although one is the norm.
    pub fn add_hook<F, Fut>(&self, name: &'static str, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hooks
            .lock()
            .push((name, Box::new(move || Box::pin(hook()))));
    }

    /// Run all registered hooks concurrently and await them.
    ///
    /// Hooks are drained, so a second call is a no-op. Returns false if the
    /// teardown timeout elapsed with hooks still pending.
    pub async fn shutdown(&self) -> bool {
        let hooks = std::mem::take(&mut *self.hooks.lock());
        if hooks.is_empty() {
            return true;
        }

        let (names, futures): (Vec<_>, Vec<_>) = hooks
            .into_iter()
            .map(|(name, hook)| (name, hook()))
            .unzip();
        info!(count = names.len(), "Running teardown hooks");

        match tokio::time::timeout(self.timeout, future::join_all(futures)).await {
            Ok(_) => {
                info!("All teardown hooks settled");
                true
            }
            Err(_) => {
                warn!(
                    timeout = ?self.timeout,
                    hooks = ?names,
                    "Teardown timed out; abandoning unsettled hooks"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_hooks_run_concurrently_and_settle() {
        let lifecycle = Lifecycle::new(Duration::from_secs(5));
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            lifecycle.add_hook("test", move || async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        let start = std::time::Instant::now();
        assert!(lifecycle.shutdown().await);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        // Three 20ms hooks joined concurrently settle well under 60ms.
        assert!(start.elapsed() < Duration::from_millis(55));
    }

    #[tokio::test]
    async fn test_hung_hook_is_abandoned() {
        let lifecycle = Lifecycle::new(Duration::from_millis(50));
        lifecycle.add_hook("hung", || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        assert!(!lifecycle.shutdown().await);
    }

    #[tokio::test]
    async fn test_second_shutdown_is_noop() {
        let lifecycle = Lifecycle::new(Duration::from_millis(50));
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let counter = Arc::clone(&counter);
            lifecycle.add_hook("once", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert!(lifecycle.shutdown().await);
        assert!(lifecycle.shutdown().await);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
