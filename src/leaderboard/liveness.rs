//! View liveness
//!
//! A flag owned by a mounted view. Work that completes after the view is gone
//! checks it and does nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "is the view still mounted" flag
#[derive(Debug, Clone)]
pub struct Liveness {
    alive: Arc<AtomicBool>,
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Mark the view as gone. Returns `true` only for the call that flipped it.
    pub fn dispose(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }

    /// Run `f` only while the view is mounted
    pub fn run_if_alive<T>(&self, f: impl FnOnce() -> T) -> Option<T> {
        if self.is_alive() {
            Some(f())
        } else {
            None
        }
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}
