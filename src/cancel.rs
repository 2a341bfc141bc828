use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{HistoryError, Result};

/// Shared flag that aborts an in-flight history collection.
///
/// Clones observe the same flag, so a caller can keep one handle and pass
/// another into [`HistoryRequest`](crate::history::HistoryRequest).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(HistoryError::Cancelled)
        } else {
            Ok(())
        }
    }
}
