use std::sync::atomic::{AtomicBool, Ordering};

/// Single-use latch: armed on creation, fired at most once
///
/// Owned by the component instance it protects, so a fresh page load gets a fresh latch.
#[derive(Debug, Default)]
pub struct RunOnceLatch {
    fired: AtomicBool,
}

impl RunOnceLatch {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
        }
    }

    /// Fire the latch; `true` only for the first caller
    pub fn fire(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }

    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}
