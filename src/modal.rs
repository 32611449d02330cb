//! Modal scope tracking
//!
//! While a full-screen viewer is open the page behind it must not scroll.
//! [`ScrollLock`] counts open modal scopes; each [`ModalGuard`] releases its
//! scope when dropped, on every exit path.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared scroll lock owned by the top-level view stack
#[derive(Debug, Clone, Default)]
pub struct ScrollLock {
    depth: Arc<AtomicUsize>,
}

impl ScrollLock {
    /// Create an unlocked scroll lock
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a modal scope; scrolling stays locked until the guard drops
    #[must_use = "the scope is released as soon as the guard is dropped"]
    pub fn acquire(&self) -> ModalGuard {
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(depth, "modal scope acquired");
        ModalGuard { depth: Arc::clone(&self.depth) }
    }

    /// Returns true while any modal scope is open
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }
}

/// One open modal scope
#[derive(Debug)]
pub struct ModalGuard {
    depth: Arc<AtomicUsize>,
}

impl Drop for ModalGuard {
    fn drop(&mut self) {
        let previous = self.depth.fetch_sub(1, Ordering::SeqCst);
        assert!(previous > 0, "Modal scope released twice");
        tracing::trace!(depth = previous - 1, "modal scope released");
    }
}
