//! Category sorter worker (spec §4.4): loads every intermediate object for
//! one terminal category into memory, stably resorts the key bytes that
//! weren't already fixed by the radix passes, and writes the single output
//! object.

use snafu::{ResultExt, Snafu};
use sort_core::{RecordSchemaError, KEY_SIZE, RECORD_SIZE};
use sort_store::StoreError;

use crate::internal_events::{self, CategorySortCompleted};
use crate::worker_context::WorkerContext;

#[derive(Debug, Snafu)]
pub enum CategorySorterError {
    #[snafu(display("failed to read intermediate object: {source}"))]
    Read { source: StoreError },
    #[snafu(display("failed to write output object: {source}"))]
    Write { source: StoreError },
    #[snafu(display("{source}"))]
    Schema { source: RecordSchemaError },
}

/// One category-sorter invocation's input, per spec §4.4.
pub struct CategorySortTask {
    pub keys_list: Vec<String>,
    pub prefix: String,
    pub category_stack_depth: usize,
    pub consider_last_byte_sorted: bool,
    pub id: u64,
}

pub struct CategorySortOutput {
    pub key: String,
    pub record_count: u64,
    pub byte_size: u64,
}

pub fn run(
    ctx: &WorkerContext,
    task: CategorySortTask,
) -> Result<CategorySortOutput, CategorySorterError> {
    let mut buf = Vec::new();
    for key in &task.keys_list {
        let mut reader = ctx.store().open_read(key).context(ReadSnafu)?;
        std::io::Read::read_to_end(&mut reader, &mut buf).map_err(|source| {
            CategorySorterError::Read {
                source: StoreError::Read {
                    key: key.clone(),
                    source,
                },
            }
        })?;
    }

    sort_core::validate_record_buffer(&buf).context(SchemaSnafu)?;

    // spec §4.4 step 2: bytes already fixed by the radix passes don't need
    // to be compared again.
    let num_bytes_already_sorted = task
        .category_stack_depth
        .saturating_sub(if task.consider_last_byte_sorted { 0 } else { 1 })
        .min(KEY_SIZE);

    let mut records: Vec<[u8; RECORD_SIZE]> = buf
        .chunks_exact(RECORD_SIZE)
        .map(|chunk| chunk.try_into().expect("chunk is exactly RECORD_SIZE"))
        .collect();

    records.sort_by(|a, b| {
        a[num_bytes_already_sorted..KEY_SIZE].cmp(&b[num_bytes_already_sorted..KEY_SIZE])
    });

    let key = format!("{}/{}", task.prefix, task.id);
    let mut writer = ctx.store().open_write(&key, false).context(WriteSnafu)?;
    for record in &records {
        std::io::Write::write_all(&mut writer, record).map_err(|source| {
            CategorySorterError::Write {
                source: StoreError::Write {
                    key: key.clone(),
                    source,
                },
            }
        })?;
    }
    writer.finish().context(WriteSnafu)?;

    let byte_size = (records.len() * RECORD_SIZE) as u64;
    internal_events::emit(CategorySortCompleted {
        id: task.id,
        record_count: records.len() as u64,
        byte_size,
        num_bytes_already_sorted,
    });

    Ok(CategorySortOutput {
        key,
        record_count: records.len() as u64,
        byte_size,
    })
}
