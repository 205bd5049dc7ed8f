//! Search budgets and cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Shared flag that makes a running solve cooperatively stoppable.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Stopping conditions for a solve. Whichever bound is reached first wins;
/// an unbounded budget only stops on cancellation.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    pub time_limit: Option<Duration>,
    pub max_simulations: Option<u64>,
    pub cancel: Option<CancelHandle>,
}

impl Budget {
    pub fn simulations(max_simulations: u64) -> Self {
        Self {
            max_simulations: Some(max_simulations),
            ..Self::default()
        }
    }

    pub fn time_limit(limit: Duration) -> Self {
        Self {
            time_limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelHandle::is_cancelled)
    }
}
