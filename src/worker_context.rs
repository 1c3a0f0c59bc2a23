//! The explicit context every worker function takes as its first
//! parameter, instead of reading an ambient object-store client or
//! closed-over configuration (spec §9 redesign flag).

use std::sync::Arc;

use sort_store::ObjectStore;

/// Bundles everything a worker needs to talk to the object store, sized
/// by the shuffle planner's buffer budget.
#[derive(Clone)]
pub struct WorkerContext {
    store: Arc<dyn ObjectStore>,
    buffer_size_to_categorize: usize,
}

impl WorkerContext {
    pub fn new(store: Arc<dyn ObjectStore>, buffer_size_to_categorize: usize) -> Self {
        assert!(
            buffer_size_to_categorize % sort_core::RECORD_SIZE == 0,
            "buffer_size_to_categorize must be a whole multiple of the record size"
        );
        Self {
            store,
            buffer_size_to_categorize,
        }
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn buffer_size_to_categorize(&self) -> usize {
        self.buffer_size_to_categorize
    }
}
