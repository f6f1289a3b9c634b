//! Progress reporting seam for long-running archive operations.
//!
//! Callers hand a listener to the packing and extraction entry points.
//! Cancellation is cooperative: the operation polls [`is_cancelled`]
//! between files, acknowledges with [`on_cancel`] and returns
//! [`Error::Cancelled`], leaving any partially written output in place.
//!
//! [`is_cancelled`]: ProgressListener::is_cancelled
//! [`on_cancel`]: ProgressListener::on_cancel
//! [`Error::Cancelled`]: crate::error::Error::Cancelled

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

/// Observer for multi-file operations. All methods have no-op defaults, so
/// implementors override only what they surface.
pub trait ProgressListener: Send + Sync {
    /// The operation determined its total unit count and is about to start.
    fn on_start(&self, _total: usize) {}

    /// One unit (usually a file) finished processing.
    fn on_file(&self, _name: &str, _index: usize, _total: usize) {}

    /// The operation ran to completion.
    fn on_finished(&self) {}

    /// Polled between units; return `true` to request a stop.
    fn is_cancelled(&self) -> bool {
        false
    }

    /// The operation observed the cancel request and is unwinding.
    fn on_cancel(&self) {}
}

/// Listener that ignores everything. The default for library callers that
/// do not care about progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressListener for NullProgress {}

/// Flag-backed listener for embedding cancellation in tests and simple
/// callers.
#[derive(Debug, Default)]
pub struct CancelFlag {
    cancelled: AtomicBool,
}

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl ProgressListener for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Poll a listener, translating a pending cancel request into the error
/// the operation propagates.
pub fn check_cancelled(listener: &dyn ProgressListener) -> Result<()> {
    if listener.is_cancelled() {
        listener.on_cancel();
        return Err(Error::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_listener_never_cancels() {
        assert!(check_cancelled(&NullProgress).is_ok());
    }

    #[test]
    fn cancel_flag_propagates() {
        let flag = CancelFlag::new();
        assert!(check_cancelled(&flag).is_ok());
        flag.cancel();
        assert!(matches!(check_cancelled(&flag), Err(Error::Cancelled)));
    }
}
