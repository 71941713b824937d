//! Scheduler capability — deferred one-shot callbacks with cancellation.
//!
//! The stage motor never touches wall-clock timers directly; it asks an
//! injected scheduler to run a callback after a delay and holds the returned
//! token. Tests drive the motor with a virtual clock instead of waiting.

use std::time::Duration;

/// Cancels a pending scheduled callback. Dropping the token without calling
/// [`CancelToken::cancel`] leaves the callback pending.
pub struct CancelToken(Box<dyn FnOnce() + Send>);

impl CancelToken {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(cancel))
    }

    /// Cancel the pending callback. Idempotent in effect: cancelling a
    /// callback that already fired is a no-op.
    pub fn cancel(self) {
        (self.0)()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CancelToken")
    }
}

/// Schedules exactly-once deferred callbacks.
pub trait Scheduler: Send + Sync {
    /// Run `callback` after `delay`. The returned token cancels it while
    /// still pending.
    fn after(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> CancelToken;
}
