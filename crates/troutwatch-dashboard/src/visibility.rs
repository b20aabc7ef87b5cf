//! Page-visibility gate for the refresh loop.
//!
//! The dashboard page reports whether it is visible; while it is hidden
//! the controller skips its periodic cycles. Shared between the loop task
//! and the HTTP handlers as `Arc<VisibilityGate>`, lock-free.

use std::sync::atomic::{AtomicBool, Ordering};

/// Shared visible/hidden flag.
#[derive(Debug)]
pub struct VisibilityGate {
    visible: AtomicBool,
}

impl VisibilityGate {
    /// Gate starting in the given state.
    pub const fn new(visible: bool) -> Self {
        Self {
            visible: AtomicBool::new(visible),
        }
    }

    /// Whether refresh cycles should run.
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    /// Set visibility. Returns the previous value.
    pub fn set_visible(&self, visible: bool) -> bool {
        self.visible.swap(visible, Ordering::AcqRel)
    }
}

impl Default for VisibilityGate {
    fn default() -> Self {
        Self::new(true)
    }
}
