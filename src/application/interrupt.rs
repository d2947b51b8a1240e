//! SIGINT tracking.
//!
//! The handler only records the signal. Loops poll [`Interrupt::take`] at their
//! per-item boundary so one interrupt costs one item, not the whole run.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route SIGINT into this flag. Other signals keep their default disposition.
    /// Can only be done once per process.
    pub fn install(&self) -> Result<()> {
        let flag = Arc::clone(&self.flag);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .context("Failed to set SIGINT handler")
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn pending(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Whether an interrupt arrived since the last call. Clears the flag.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}
