use crate::error::HttpError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline and cancellation shared by a request and the read of its body.
///
/// The deadline is fixed when the request is sent, so the body read only gets
/// whatever time the exchange has left.
#[derive(Debug, Clone)]
pub struct RequestGuard {
    deadline: Instant,
    timeout: Duration,
    cancel: Option<CancellationToken>,
}

impl RequestGuard {
    pub(crate) fn start(timeout: Duration, cancel: Option<CancellationToken>) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            timeout,
            cancel,
        }
    }

    /// Timeout the deadline was derived from
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the request's token has already fired
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Drive `fut` until it completes, the deadline passes or the token fires.
    ///
    /// Cancellation wins over a result that becomes ready in the same poll.
    pub(crate) async fn run<T, F>(&self, fut: F) -> Result<T, HttpError>
    where
        F: Future<Output = Result<T, HttpError>>,
    {
        let timed = tokio::time::timeout_at(self.deadline, fut);
        let outcome = match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => return Err(HttpError::Cancelled),
                    outcome = timed => outcome,
                }
            }
            None => timed.await,
        };
        outcome.unwrap_or(Err(HttpError::Timeout(self.timeout)))
    }
}
