use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between an owner and its workers.
///
/// Cancellation is never preemptive: workers poll [`CancelToken::is_cancelled`]
/// between units of work and stop on their own.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns true while the owner is still interested in the result.
    pub fn is_alive(&self) -> bool {
        !self.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::CancelToken;

    #[test]
    fn clones_observe_cancellation() {
        let token = CancelToken::new();
        let worker = token.clone();
        assert!(worker.is_alive());

        token.cancel();
        assert!(worker.is_cancelled());
        assert!(!worker.is_alive());
    }

    #[test]
    fn cancel_is_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }
}
