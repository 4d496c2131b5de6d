//! Cooperative cancellation

use std::{future::Future, sync::Arc};

use tokio::sync::watch;

/// Cancellation signal shared between the process entry point and the pipeline
///
/// Cloning the token yields a handle to the same signal.
#[derive(Clone, Debug)]
pub struct CancelToken(Arc<watch::Sender<bool>>);

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Create a new, not yet cancelled, token
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self(Arc::new(tx))
    }

    /// Signal cancellation to all holders of this token
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    /// Return true if cancellation was signaled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Wait until cancellation is signaled
    pub async fn cancelled(&self) {
        let mut rx = self.0.subscribe();
        // The sender lives in self, so the channel can not close while waiting
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Drive a future to completion unless the token is cancelled first
    ///
    /// Returns `None` if cancelled, in which case the future is dropped.
    /// An already cancelled token never polls the future.
    pub async fn run_until_cancelled<F>(&self, fut: F) -> Option<F::Output>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            () = self.cancelled() => None,
            output = fut => Some(output),
        }
    }
}
