use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// A shared flag to cooperatively stop training.
///
/// Workers check it before every row, cancelling aborts the current pass without
/// committing anything.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
