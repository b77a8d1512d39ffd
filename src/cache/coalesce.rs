//! Request coalescing: at most one in-flight execution per key.
//!
//! The first caller for a key registers a ticket and runs the producer. Any
//! caller arriving while that ticket exists waits for its result instead of
//! running the producer again. The ticket is removed as soon as the
//! execution finishes, so the next call for the key starts a new generation.
//!
//! The ticket table is only locked to register, look up, or remove tickets.
//! Producers run without the lock, so a slow key never stalls other keys.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;

/// The caller running a producer was dropped before it published a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("in-flight request was abandoned before completing")]
pub struct Abandoned;

type Slot<T, E> = watch::Receiver<Option<Result<T, E>>>;

enum Role<T, E> {
    Leader(watch::Sender<Option<Result<T, E>>>),
    Follower(Slot<T, E>),
}

/// Deduplicates concurrent executions that share a key.
///
/// # Examples
///
/// ```
/// use cacheproxy::cache::{Abandoned, Coalescer};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let group: Coalescer<&str, u32, Abandoned> = Coalescer::new();
/// let (value, shared) = group.run("answer", || async { Ok(42) }).await;
/// assert_eq!(value, Ok(42));
/// assert!(!shared);
/// # }
/// ```
pub struct Coalescer<K, T, E> {
    calls: Mutex<HashMap<K, Slot<T, E>>>,
}

impl<K, T, E> Default for Coalescer<K, T, E>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, T, E> Coalescer<K, T, E>
where
    K: Hash + Eq + Clone,
    T: Clone,
    E: Clone + From<Abandoned>,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `producer` for `key`, or joins the execution already in flight.
    ///
    /// Returns the result together with `true` when it came from another
    /// caller's execution. `producer` is only invoked when this call owns the
    /// execution.
    pub async fn run<F, Fut>(&self, key: K, producer: F) -> (Result<T, E>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let tx = match self.join(&key) {
            Role::Leader(tx) => tx,
            Role::Follower(rx) => return (wait(rx).await, true),
        };

        let ticket = Ticket {
            calls: &self.calls,
            key: Some(key),
        };
        let result = producer().await;
        ticket.retire();
        tx.send_replace(Some(result.clone()));
        (result, false)
    }

    fn join(&self, key: &K) -> Role<T, E> {
        let mut calls = self.calls.lock();
        if let Some(rx) = calls.get(key) {
            return Role::Follower(rx.clone());
        }
        let (tx, rx) = watch::channel(None);
        calls.insert(key.clone(), rx);
        Role::Leader(tx)
    }

    /// Number of keys with an execution currently in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

async fn wait<T, E>(mut rx: Slot<T, E>) -> Result<T, E>
where
    T: Clone,
    E: Clone + From<Abandoned>,
{
    match rx.wait_for(Option::is_some).await {
        Ok(slot) => (*slot).clone().unwrap_or(Err(Abandoned.into())),
        Err(_) => Err(Abandoned.into()),
    }
}

// Removes the key's entry when the owning execution ends, normally or by drop.
struct Ticket<'a, K: Hash + Eq, T, E> {
    calls: &'a Mutex<HashMap<K, Slot<T, E>>>,
    key: Option<K>,
}

impl<K: Hash + Eq, T, E> Ticket<'_, K, T, E> {
    fn retire(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let Some(key) = self.key.take() {
            self.calls.lock().remove(&key);
        }
    }
}

impl<K: Hash + Eq, T, E> Drop for Ticket<'_, K, T, E> {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum TestError {
        Boom(&'static str),
        Abandoned,
    }

    impl From<Abandoned> for TestError {
        fn from(_: Abandoned) -> Self {
            TestError::Abandoned
        }
    }

    type Group = Coalescer<String, String, TestError>;

    async fn slow(calls: &AtomicUsize, value: &str) -> Result<String, TestError> {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(value.to_owned())
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_execution() {
        let group = Arc::new(Group::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let group = Arc::clone(&group);
            let calls = Arc::clone(&calls);
            tasks.push(tokio::spawn(async move {
                group
                    .run("k".to_owned(), || slow(&calls, "value"))
                    .await
            }));
        }

        let mut shared = 0;
        for task in tasks {
            let (value, was_shared) = task.await.unwrap();
            assert_eq!(value, Ok("value".to_owned()));
            shared += usize::from(was_shared);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(shared, 9);
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_calls_each_execute() {
        let group = Group::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let (value, shared) = group.run("k".to_owned(), || slow(&calls, "v")).await;
            assert_eq!(value, Ok("v".to_owned()));
            assert!(!shared);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_reaches_every_waiter() {
        let group = Arc::new(Group::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let group = Arc::clone(&group);
            let calls = Arc::clone(&calls);
            tasks.push(tokio::spawn(async move {
                group
                    .run("k".to_owned(), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Err(TestError::Boom("upstream down"))
                    })
                    .await
                    .0
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap(), Err(TestError::Boom("upstream down")));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // The failed generation is gone; the next call runs again.
        let (value, shared) = group.run("k".to_owned(), || async { Ok("ok".into()) }).await;
        assert_eq!(value, Ok("ok".to_owned()));
        assert!(!shared);
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_keys_run_independently() {
        let group = Arc::new(Group::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let a = {
            let (group, calls) = (Arc::clone(&group), Arc::clone(&calls));
            tokio::spawn(async move { group.run("a".to_owned(), || slow(&calls, "A")).await })
        };
        let b = {
            let (group, calls) = (Arc::clone(&group), Arc::clone(&calls));
            tokio::spawn(async move { group.run("b".to_owned(), || slow(&calls, "B")).await })
        };

        assert_eq!(a.await.unwrap(), (Ok("A".to_owned()), false));
        assert_eq!(b.await.unwrap(), (Ok("B".to_owned()), false));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_owner_releases_waiters_and_key() {
        let group = Arc::new(Group::new());

        let owner = {
            let group = Arc::clone(&group);
            tokio::spawn(async move {
                group
                    .run("k".to_owned(), || async {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Ok("never".to_owned())
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert_eq!(group.in_flight(), 1);

        let waiter = {
            let group = Arc::clone(&group);
            tokio::spawn(async move {
                group
                    .run("k".to_owned(), || async { Ok("unused".to_owned()) })
                    .await
            })
        };
        tokio::task::yield_now().await;

        owner.abort();
        assert_eq!(waiter.await.unwrap(), (Err(TestError::Abandoned), true));
        assert_eq!(group.in_flight(), 0);
    }
}
