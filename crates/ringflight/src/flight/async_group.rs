//! Duplicate call suppression for async tasks.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{trace, warn};

type Outcome<T, E> = Option<Result<T, E>>;

/// Table entry for an in-flight call.
struct Flight<T, E> {
    /// Distinguishes this flight from a later one for the same key.
    id: u64,
    outcome: watch::Receiver<Outcome<T, E>>,
}

enum Role<T, E> {
    Owner(u64, watch::Sender<Outcome<T, E>>),
    Waiter(watch::Receiver<Outcome<T, E>>),
}

/// The async counterpart of [`CallGroup`](super::CallGroup).
///
/// Waiting callers are suspended on a `watch` channel instead of blocking a
/// thread. If the owning future is dropped before it finishes (for example by
/// a timeout) or its task panics, the waiters retry and one of them becomes
/// the new owner.
///
/// # Example
///
/// ```
/// use ringflight::flight::AsyncCallGroup;
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// rt.block_on(async {
///     let group: AsyncCallGroup<u64, String> = AsyncCallGroup::new();
///     let value = group.call("answer", || async { Ok(42) }).await;
///     assert_eq!(value, Ok(42));
/// });
/// ```
pub struct AsyncCallGroup<T, E> {
    calls: Mutex<HashMap<String, Flight<T, E>>>,
    next_id: AtomicU64,
}

impl<T: Clone, E: Clone> AsyncCallGroup<T, E> {
    /// Create an empty call group.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Run `work` for `key`, or join the execution already in flight.
    ///
    /// Same contract as [`CallGroup::call`](super::CallGroup::call): callers
    /// that overlap an execution share its result, and nothing is kept once
    /// it completes.
    pub async fn call<F, Fut>(&self, key: &str, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        loop {
            let role = {
                let mut calls = self.calls.lock();
                match calls.get(key) {
                    Some(flight) => Role::Waiter(flight.outcome.clone()),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                        calls.insert(key.to_string(), Flight { id, outcome: rx });
                        Role::Owner(id, tx)
                    }
                }
            };

            match role {
                Role::Owner(id, tx) => return self.run(key, id, tx, work).await,
                Role::Waiter(mut rx) => {
                    trace!(key, "Joining in-flight call");
                    let outcome = match rx.wait_for(Option::is_some).await {
                        Ok(outcome) => outcome.clone(),
                        Err(_) => None,
                    };
                    if let Some(result) = outcome {
                        return result;
                    }
                    trace!(key, "In-flight call abandoned, retrying");
                }
            }
        }
    }

    /// Forget the in-flight call for `key`.
    ///
    /// The next call for `key` starts a new execution; the current one still
    /// serves the waiters it already has.
    pub fn forget(&self, key: &str) {
        self.calls.lock().remove(key);
    }

    /// Get the number of keys with an execution in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns true if an execution is in flight for `key`.
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.calls.lock().contains_key(key)
    }

    async fn run<F, Fut>(
        &self,
        key: &str,
        id: u64,
        tx: watch::Sender<Outcome<T, E>>,
        work: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut guard = FlightGuard {
            calls: &self.calls,
            key,
            id,
            completed: false,
        };

        let result = work().await;
        tx.send_replace(Some(result.clone()));
        guard.completed = true;

        result
    }
}

impl<T: Clone, E: Clone> Default for AsyncCallGroup<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> std::fmt::Debug for AsyncCallGroup<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncCallGroup")
            .field("in_flight", &self.calls.lock().len())
            .finish()
    }
}

/// Removes the owner's table entry when the owning future finishes, is
/// dropped, or unwinds.
struct FlightGuard<'a, T, E> {
    calls: &'a Mutex<HashMap<String, Flight<T, E>>>,
    key: &'a str,
    id: u64,
    completed: bool,
}

impl<T, E> Drop for FlightGuard<'_, T, E> {
    fn drop(&mut self) {
        if !self.completed {
            warn!(key = self.key, "In-flight call abandoned by its owner");
        }

        let mut calls = self.calls.lock();
        if calls
            .get(self.key)
            .is_some_and(|flight| flight.id == self.id)
        {
            calls.remove(self.key);
        }
    }
}
