//! Per-thread lock registry
//!
//! One `tokio::sync::Mutex` per conversation thread, created lazily under a
//! single registry lock. Guards are owned, so the lock is released when the
//! guard drops on every exit path. There is no timeout: a run that never
//! finishes blocks later runs for the same thread.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

#[derive(Debug, Default)]
pub struct ThreadLockRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ThreadLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `thread_id`
    pub async fn acquire(&self, thread_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(thread_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        match lock.clone().try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                debug!(thread_id, "waiting for thread lock");
                lock.lock_owned().await
            }
        }
    }

    /// Number of threads that have been locked at least once
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_thread_is_serialized() {
        let registry = Arc::new(ThreadLockRegistry::new());
        let guard = registry.acquire("th-1").await;

        let r = registry.clone();
        let waiter = tokio::spawn(async move {
            let _guard = r.acquire("th-1").await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_distinct_threads_do_not_block() {
        let registry = ThreadLockRegistry::new();
        let _a = registry.acquire("th-a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), registry.acquire("th-b")).await;
        assert!(b.is_ok());
        assert_eq!(registry.len().await, 2);
    }
}
