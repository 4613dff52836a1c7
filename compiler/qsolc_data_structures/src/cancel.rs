// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.


use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A cancellation signal shared between a pipeline and its caller. The pipeline polls
/// the token at stage boundaries and at each grounding expansion; once set, the token
/// stays set.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
