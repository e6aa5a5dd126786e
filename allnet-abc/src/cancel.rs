//! Cancellation token (spec §9: "replace the `volatile sig_atomic_t
//! terminate` flag with a cancellation token checked at loop heads and
//! propagated to the blocking-receive primitive"). A `CancelToken` is
//! cheap to clone and safe to share across the one thread that actually
//! reads it plus whatever signal handler (external to this crate) sets
//! it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Called from a SIGINT/SIGTERM handler (external to this crate).
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled_and_latches() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
