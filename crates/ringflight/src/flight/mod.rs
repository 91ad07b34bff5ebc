//! Duplicate call suppression.
//!
//! A call group makes sure that only one execution of a piece of work is in
//! flight for a given key at a time. Callers that arrive while the work is
//! running wait for it and receive the same result instead of repeating it.
//! Nothing is cached: once the work finishes, the next call runs it again.

mod async_group;

pub use async_group::AsyncCallGroup;

use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{trace, warn};

/// Outcome slot of one in-flight call.
enum CallState<T, E> {
    Pending,
    Finished(Result<T, E>),
    /// The owner unwound before producing a result.
    Abandoned,
}

/// An in-flight call shared by its owner and waiters.
struct Call<T, E> {
    state: Mutex<CallState<T, E>>,
    done: Condvar,
}

impl<T: Clone, E: Clone> Call<T, E> {
    fn new() -> Self {
        Self {
            state: Mutex::new(CallState::Pending),
            done: Condvar::new(),
        }
    }

    /// Settle a pending call and wake every waiter.
    ///
    /// Returns false if the call was already settled.
    fn settle(&self, outcome: CallState<T, E>) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, CallState::Pending) {
            return false;
        }
        *state = outcome;
        self.done.notify_all();
        true
    }

    /// Block until the call settles.
    ///
    /// Returns `None` if the owner abandoned the call.
    fn wait(&self) -> Option<Result<T, E>> {
        let mut state = self.state.lock();
        loop {
            match &*state {
                CallState::Pending => self.done.wait(&mut state),
                CallState::Finished(result) => return Some(result.clone()),
                CallState::Abandoned => return None,
            }
        }
    }
}

/// A namespace of keys in which work runs with duplicate suppression.
///
/// The group lock only guards the table of in-flight calls; the work itself
/// runs unlocked, so calls for different keys proceed in parallel.
///
/// # Example
///
/// ```
/// use ringflight::flight::CallGroup;
///
/// let group: CallGroup<u64, String> = CallGroup::new();
/// let value = group.call("answer", || Ok(42));
/// assert_eq!(value, Ok(42));
/// ```
pub struct CallGroup<T, E> {
    calls: Mutex<HashMap<String, Arc<Call<T, E>>>>,
}

impl<T: Clone, E: Clone> CallGroup<T, E> {
    /// Create an empty call group.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Run `work` for `key`, or join the execution already in flight.
    ///
    /// The first caller for a key runs `work`; callers that arrive before it
    /// finishes block and receive a clone of its result without running their
    /// own `work`. Errors are shared the same way as values.
    ///
    /// If the running `work` panics, the panic propagates to its caller and
    /// the waiters are released; they retry, and one of them runs its own
    /// `work` in a new execution.
    pub fn call<F>(&self, key: &str, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        loop {
            let call = {
                let mut calls = self.calls.lock();
                match calls.get(key) {
                    Some(call) => Arc::clone(call),
                    None => {
                        let call = Arc::new(Call::new());
                        calls.insert(key.to_string(), Arc::clone(&call));
                        drop(calls);
                        return self.run(key, call, work);
                    }
                }
            };

            trace!(key, "Joining in-flight call");
            if let Some(result) = call.wait() {
                return result;
            }
            trace!(key, "In-flight call abandoned, retrying");
        }
    }

    /// Forget the in-flight call for `key`.
    ///
    /// The next call for `key` starts a new execution instead of joining the
    /// current one. The current execution still completes and its existing
    /// waiters still receive its result.
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

    fn run<F>(&self, key: &str, call: Arc<Call<T, E>>, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let guard = OwnerGuard {
            calls: &self.calls,
            key,
            call,
        };

        let result = work();
        guard.call.settle(CallState::Finished(result.clone()));
        drop(guard);

        result
    }
}

impl<T: Clone, E: Clone> Default for CallGroup<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> std::fmt::Debug for CallGroup<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallGroup")
            .field("in_flight", &self.calls.lock().len())
            .finish()
    }
}

/// Releases an owner's call on every exit path, including unwinding.
struct OwnerGuard<'a, T, E> {
    calls: &'a Mutex<HashMap<String, Arc<Call<T, E>>>>,
    key: &'a str,
    call: Arc<Call<T, E>>,
}

impl<T, E> Drop for OwnerGuard<'_, T, E> {
    fn drop(&mut self) {
        {
            let mut state = self.call.state.lock();
            if matches!(*state, CallState::Pending) {
                warn!(key = self.key, "In-flight call abandoned by its owner");
                *state = CallState::Abandoned;
                self.call.done.notify_all();
            }
        }

        let mut calls = self.calls.lock();
        // The key may have been forgotten and claimed by a newer call.
        if calls
            .get(self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &self.call))
        {
            calls.remove(self.key);
        }
    }
}
