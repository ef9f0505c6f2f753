use crate::error::{HttpError, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Idle-timeout and cancellation guard for one attempt.
///
/// Every suspension point of the attempt runs through [`IdleGuard::run`], so
/// the window restarts whenever the socket makes progress. A fresh guard is
/// created per attempt; redirect hops never inherit an earlier window.
pub(crate) struct IdleGuard {
    url: String,
    window: Duration,
    cancel: CancellationToken,
}

impl IdleGuard {
    pub(crate) fn new(url: String, window: Duration, cancel: CancellationToken) -> Self {
        Self {
            url,
            window,
            cancel,
        }
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// Drive `operation` until it completes, the window elapses, or the
    /// caller cancels. On timeout or cancellation the operation is dropped,
    /// which aborts the in-flight transport call.
    pub(crate) async fn run<F, T>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(HttpError::Cancelled),
            outcome = tokio::time::timeout(self.window, operation) => match outcome {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(url = %self.url, idle_ms = self.window.as_millis() as u64, "attempt timed out");
                    Err(HttpError::Timeout {
                        url: self.url.clone(),
                        idle: self.window,
                    })
                }
            },
        }
    }
}
