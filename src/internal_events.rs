//! Structured observability events, following the `InternalEvent` +
//! `emit()` pattern from `lib/vector-buffers/src/internal_events.rs`: one
//! small struct per notable occurrence, constructed at the call site and
//! consumed by value so the fields that drove the metric can't be reused
//! afterwards.

use metrics::{counter, gauge};

/// Implemented by every internal event in this crate.
pub trait InternalEvent {
    fn emit(self);
}

pub fn emit(event: impl InternalEvent) {
    event.emit();
}

pub struct PartitionChunkFlushed {
    pub category_stack: String,
    pub pass: usize,
    pub bytes_written: u64,
    pub categories_written: usize,
}

impl InternalEvent for PartitionChunkFlushed {
    fn emit(self) {
        tracing::debug!(
            category_stack = %self.category_stack,
            pass = self.pass,
            bytes_written = self.bytes_written,
            categories_written = self.categories_written,
            "flushed partition buffer"
        );
        counter!("partition_chunk_bytes_written_total", "pass" => self.pass.to_string())
            .increment(self.bytes_written);
        counter!("partition_chunks_flushed_total", "pass" => self.pass.to_string()).increment(1);
    }
}

pub struct PartitionWorkerCompleted {
    pub category_stack: String,
    pub bytes_read: u64,
    pub objects_read: usize,
    pub categories_produced: usize,
}

impl InternalEvent for PartitionWorkerCompleted {
    fn emit(self) {
        tracing::info!(
            category_stack = %self.category_stack,
            bytes_read = self.bytes_read,
            objects_read = self.objects_read,
            categories_produced = self.categories_produced,
            "partition worker finished"
        );
        counter!("partition_worker_bytes_read_total").increment(self.bytes_read);
        counter!("partition_worker_objects_read_total").increment(self.objects_read as u64);
    }
}

pub struct CategorySortCompleted {
    pub id: u64,
    pub record_count: u64,
    pub byte_size: u64,
    pub num_bytes_already_sorted: usize,
}

impl InternalEvent for CategorySortCompleted {
    fn emit(self) {
        tracing::info!(
            id = self.id,
            record_count = self.record_count,
            byte_size = self.byte_size,
            num_bytes_already_sorted = self.num_bytes_already_sorted,
            "category sorter finished"
        );
        counter!("category_sort_records_total").increment(self.record_count);
        counter!("category_sort_bytes_total").increment(self.byte_size);
    }
}

pub struct ShufflePassCompleted {
    pub pass: usize,
    pub task_count: usize,
    pub values_per_category: u32,
}

impl InternalEvent for ShufflePassCompleted {
    fn emit(self) {
        tracing::info!(
            pass = self.pass,
            task_count = self.task_count,
            values_per_category = self.values_per_category,
            "radix pass complete"
        );
        gauge!("shuffle_pass_task_count", "pass" => self.pass.to_string())
            .set(self.task_count as f64);
    }
}

pub struct CategorySkewDetected {
    pub category_stack: String,
    pub task_count: usize,
    pub mean_task_count: f64,
}

impl InternalEvent for CategorySkewDetected {
    fn emit(self) {
        tracing::warn!(
            category_stack = %self.category_stack,
            task_count = self.task_count,
            mean_task_count = self.mean_task_count,
            "category task count far exceeds the mean; repartitioning estimate may be off"
        );
        counter!("shuffle_skewed_categories_total").increment(1);
    }
}
