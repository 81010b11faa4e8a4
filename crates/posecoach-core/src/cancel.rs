//! Cooperative cancellation, checked at stage and batch boundaries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};

/// A cheaply-cloneable flag an external caller can set to abort an in-flight
/// `analyze()` call at the next stage or batch boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Returns `Err(CoreError::Cancelled)` if cancellation has been
    /// requested; otherwise `Ok(())`. Call this between stages and between
    /// inference batches.
    pub fn check(&self) -> CoreResult<()> {
        if self.is_cancelled() {
            Err(CoreError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncancelled_token_checks_ok() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());
    }

    #[test]
    fn cancelled_token_fails_check() {
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(token.check(), Err(CoreError::Cancelled)));
    }

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
