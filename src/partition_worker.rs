//! Streaming partition worker (spec §4.3): reads one or more input objects
//! into a fixed-capacity scratch buffer, classifies whenever the buffer
//! fills, and writes each non-empty category range out as an intermediate
//! object.

use std::collections::BTreeMap;
use std::io::Read;

use snafu::{ResultExt, Snafu};
use sort_core::{CategoryStack, ClassifyError};
use sort_store::StoreError;

use crate::internal_events::{self, PartitionChunkFlushed, PartitionWorkerCompleted};
use crate::worker_context::WorkerContext;

#[derive(Debug, Snafu)]
pub enum PartitionWorkerError {
    #[snafu(display("failed to read input object: {source}"))]
    Read { source: StoreError },
    #[snafu(display("failed to write intermediate object: {source}"))]
    Write { source: StoreError },
    #[snafu(display("failed to classify buffer: {source}"))]
    Classify { source: ClassifyError },
}

/// One partition-worker invocation's input, per spec §4.3.
pub struct PartitionTask {
    pub keys_list: Vec<String>,
    /// Already includes the `-intermediate{p}` pass suffix.
    pub prefix: String,
    pub category_stack: CategoryStack,
    pub values_per_category: u32,
    pub worker_id: String,
}

/// This worker's output: for every category it produced at least one
/// record for, the resulting stack and the intermediate object keys
/// written under it — returned explicitly rather than left for the
/// coordinator to parse back out of an object name (spec §9 redesign flag).
pub struct PartitionWorkerOutput {
    pub category_stack: CategoryStack,
    pub produced: Vec<(CategoryStack, Vec<String>)>,
}

/// Runs one partition-worker task to completion.
///
/// `byte_index` for classification is `category_stack.depth()` (spec
/// §4.3 step 3): the pass number is implicit in how deep the stack
/// already is.
pub fn run(
    ctx: &WorkerContext,
    task: PartitionTask,
) -> Result<PartitionWorkerOutput, PartitionWorkerError> {
    let byte_index = task.category_stack.depth();
    let capacity = ctx.buffer_size_to_categorize();
    let mut buf = vec![0u8; capacity];
    let mut len = 0usize;
    let mut chunk_id: u64 = 0;
    let mut produced: BTreeMap<u8, Vec<String>> = BTreeMap::new();

    let mut total_bytes_read: u64 = 0;
    let objects_read = task.keys_list.len();

    for key in &task.keys_list {
        let mut reader = ctx.store().open_read(key).context(ReadSnafu)?;
        loop {
            let n = reader
                .read(&mut buf[len..capacity])
                .map_err(|source| PartitionWorkerError::Read {
                    source: StoreError::Read {
                        key: key.clone(),
                        source,
                    },
                })?;
            if n == 0 {
                break; // this input object is exhausted; move to the next key
            }
            len += n;
            total_bytes_read += n as u64;

            if len == capacity {
                flush(ctx, &task, byte_index, &buf[..len], &mut chunk_id, &mut produced)?;
                len = 0;
            }
        }
    }

    if len > 0 {
        flush(ctx, &task, byte_index, &buf[..len], &mut chunk_id, &mut produced)?;
    }

    let produced: Vec<(CategoryStack, Vec<String>)> = produced
        .into_iter()
        .map(|(cat, keys)| (task.category_stack.pushed(cat), keys))
        .collect();

    internal_events::emit(PartitionWorkerCompleted {
        category_stack: task.category_stack.to_path_string(),
        bytes_read: total_bytes_read,
        objects_read,
        categories_produced: produced.len(),
    });

    Ok(PartitionWorkerOutput {
        category_stack: task.category_stack,
        produced,
    })
}

fn flush(
    ctx: &WorkerContext,
    task: &PartitionTask,
    byte_index: usize,
    filled: &[u8],
    chunk_id: &mut u64,
    produced: &mut BTreeMap<u8, Vec<String>>,
) -> Result<(), PartitionWorkerError> {
    let (sorted, ranges) = sort_core::classify(filled, byte_index, task.values_per_category)
        .context(ClassifySnafu)?;

    let mut bytes_written = 0u64;
    for range in &ranges {
        let new_stack = task.category_stack.pushed(range.category_id);
        let key = format!(
            "{}/{}/{}/iter{}",
            task.prefix,
            new_stack.to_path_string(),
            task.worker_id,
            chunk_id
        );
        let mut writer = ctx.store().open_write(&key, false).context(WriteSnafu)?;
        let slice = &sorted[range.start * sort_core::RECORD_SIZE..range.end * sort_core::RECORD_SIZE];
        std::io::Write::write_all(&mut writer, slice).map_err(|source| PartitionWorkerError::Write {
            source: StoreError::Write {
                key: key.clone(),
                source,
            },
        })?;
        writer.finish().context(WriteSnafu)?;
        bytes_written += slice.len() as u64;
        produced.entry(range.category_id).or_default().push(key);
    }

    internal_events::emit(PartitionChunkFlushed {
        category_stack: task.category_stack.to_path_string(),
        pass: byte_index,
        bytes_written,
        categories_written: ranges.len(),
    });

    *chunk_id += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sort_core::RECORD_SIZE;
    use sort_store::memory::InMemoryObjectStore;
    use std::sync::Arc;

    fn record(key0: u8) -> Vec<u8> {
        let mut r = vec![0u8; RECORD_SIZE];
        r[0] = key0;
        r
    }

    #[test]
    fn splits_into_categories_without_empty_intermediates() {
        let store = Arc::new(InMemoryObjectStore::new());
        {
            let mut w = store.open_write("in/0", false).unwrap();
            for key in [5u8, 1, 200] {
                std::io::Write::write_all(&mut w, &record(key)).unwrap();
            }
            w.finish().unwrap();
        }

        let ctx = WorkerContext::new(store.clone(), RECORD_SIZE * 4);
        let task = PartitionTask {
            keys_list: vec!["in/0".to_string()],
            prefix: "out-intermediate0".to_string(),
            category_stack: CategoryStack::root(),
            values_per_category: 1,
            worker_id: "w0".to_string(),
        };

        let output = run(&ctx, task).unwrap();
        let mut cats: Vec<u8> = output.produced.iter().map(|(s, _)| s.ids()[0]).collect();
        cats.sort_unstable();
        assert_eq!(cats, vec![1, 5, 200]);
        for (_, keys) in &output.produced {
            assert_eq!(keys.len(), 1);
        }
    }

    #[test]
    fn straddling_object_boundary_does_not_lose_records() {
        let store = Arc::new(InMemoryObjectStore::new());
        {
            let mut w = store.open_write("in/a", false).unwrap();
            std::io::Write::write_all(&mut w, &record(10)).unwrap();
            w.finish().unwrap();
        }
        {
            let mut w = store.open_write("in/b", false).unwrap();
            std::io::Write::write_all(&mut w, &record(20)).unwrap();
            w.finish().unwrap();
        }

        // buffer holds exactly one record, forcing a flush between objects
        let ctx = WorkerContext::new(store.clone(), RECORD_SIZE);
        let task = PartitionTask {
            keys_list: vec!["in/a".to_string(), "in/b".to_string()],
            prefix: "out-intermediate0".to_string(),
            category_stack: CategoryStack::root(),
            values_per_category: 1,
            worker_id: "w0".to_string(),
        };

        let output = run(&ctx, task).unwrap();
        let total_keys: usize = output.produced.iter().map(|(_, k)| k.len()).sum();
        assert_eq!(total_keys, 2);
    }
}
