//! Tokio-backed scheduler: the production implementation of the
//! [`Scheduler`] capability.
//!
//! Each deferred callback is a spawned task sleeping until its deadline;
//! the cancel token aborts the task. Must be used from within a tokio
//! runtime.

use philovoid_core::scheduler::{CancelToken, Scheduler};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> CancelToken {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        CancelToken::new(move || handle.abort())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn callback_fires_after_the_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let scheduler = TokioScheduler::new();

        let _token = scheduler.after(
            Duration::from_secs(5),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_callback_never_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let scheduler = TokioScheduler::new();

        let token = scheduler.after(
            Duration::from_secs(5),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );
        token.cancel();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
