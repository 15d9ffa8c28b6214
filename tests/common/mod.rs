#![allow(dead_code)]

pub mod forms;
pub mod test_app;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Counts handler invocations
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
