/// Receives the message of a logical failure (`code == -1` with a message in
/// an otherwise successful response).
///
/// Called inline on the request path and must not block.
pub trait WarningNotifier: Send + Sync {
    fn warn(&self, msg: &str);
}

/// Emits logical failures as `tracing` warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl WarningNotifier for TracingNotifier {
    fn warn(&self, msg: &str) {
        tracing::warn!(target: "admin_gateway::notify", msg, "backend reported failure");
    }
}

impl<F> WarningNotifier for F
where
    F: Fn(&str) + Send + Sync,
{
    fn warn(&self, msg: &str) {
        self(msg);
    }
}
