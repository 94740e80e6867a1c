//! Cooperative cancellation.
//!
//! Signals are only polled between root subtrees, never while a single type is
//! being validated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{WeaveError, WeaveResult};

/// Host-supplied flag asking the pipeline to stop early.
pub trait CancellationSignal {
    /// Return `true` once the run should stop.
    fn is_cancelled(&self) -> bool;
}

/// Signal that never fires.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverCancel;

impl CancellationSignal for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl CancellationSignal for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

impl<T: CancellationSignal + ?Sized> CancellationSignal for Arc<T> {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<T: CancellationSignal + ?Sized> CancellationSignal for &T {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

pub(crate) fn checkpoint(cancel: &dyn CancellationSignal, stage: &'static str) -> WeaveResult<()> {
    if cancel.is_cancelled() {
        tracing::warn!(stage, "weaving cancelled");
        return Err(WeaveError::Cancelled { stage });
    }
    Ok(())
}
