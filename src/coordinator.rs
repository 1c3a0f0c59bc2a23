//! Shuffle coordinator (spec §4.6): drives `num_passes` radix passes
//! followed by one category-sort pass, and owns the only barrier in the
//! whole system — waiting for every task of pass `p` before building pass
//! `p + 1`'s descriptors.

use std::collections::BTreeMap;
use std::sync::Arc;

use snafu::{ResultExt, Snafu};
use sort_core::{array_split, plan, CategoryStack, PlannerError};
use sort_runtime::{TaskError, TaskRunner};
use sort_store::{ObjectStore, StoreError};

use crate::category_sorter::{self, CategorySortTask};
use crate::config::Config;
use crate::internal_events::{self, CategorySkewDetected, ShufflePassCompleted};
use crate::partition_worker::{self, PartitionTask};
use crate::worker_context::WorkerContext;

#[derive(Debug, Snafu)]
pub enum CoordinatorError {
    #[snafu(display("planner error: {source}"))]
    Plan { source: PlannerError },
    #[snafu(display("failed to list input objects under {prefix}: {source}"))]
    ListInputs { prefix: String, source: StoreError },
    #[snafu(display("partition task failed: {message}"))]
    PartitionTaskFailed { message: String },
    #[snafu(display("category sort task failed: {message}"))]
    CategorySortTaskFailed { message: String },
    #[snafu(display(
        "output size {output_bytes} does not match input size {input_bytes}"
    ))]
    SizeMismatch { input_bytes: u64, output_bytes: u64 },
}

/// A final CLI summary line: passes run, tasks dispatched per pass, total
/// bytes moved. Also used to check the spec's output-size invariant.
#[derive(Debug, Clone)]
pub struct SortSummary {
    pub num_passes: u32,
    pub values_per_category: u32,
    pub tasks_per_pass: Vec<usize>,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub output_objects: usize,
}

/// One task in flight between passes: a category stack plus the
/// intermediate (or, for pass 0, input) objects that belong to it.
struct Task {
    category_stack: CategoryStack,
    keys: Vec<String>,
}

pub async fn run<R: TaskRunner>(
    config: &Config,
    store: Arc<dyn ObjectStore>,
    runner: &R,
) -> Result<SortSummary, CoordinatorError> {
    let ctx = WorkerContext::new(Arc::clone(&store), crate::config::BUFFER_SIZE_TO_CATEGORIZE as usize);

    let input_objects = store
        .list_objects(&config.input_prefix)
        .await
        .context(ListInputsSnafu {
            prefix: config.input_prefix.clone(),
        })?;
    let input_bytes: u64 = input_objects.iter().map(|o| o.size).sum();

    let (num_passes, values_per_category) = plan(
        input_bytes,
        crate::config::BUFFER_SIZE_TO_CATEGORIZE,
        crate::config::RECORD_SIZE,
    )
    .context(PlanSnafu)?;

    let mut tasks: Vec<Task> = input_objects
        .into_iter()
        .map(|o| Task {
            category_stack: CategoryStack::root(),
            keys: vec![o.key],
        })
        .collect();

    // With zero radix passes the loop below never runs to merge anything,
    // so every input object would otherwise become its own independent
    // category-sort task — wrong whenever input key ranges overlap (open
    // question 1, DESIGN.md: zero-pass planning is a plain in-memory sort
    // of *all* the original inputs together, not one per object).
    if num_passes == 0 {
        let keys: Vec<String> = tasks.into_iter().flat_map(|t| t.keys).collect();
        tasks = vec![Task {
            category_stack: CategoryStack::root(),
            keys,
        }];
    }

    let mut tasks_per_pass = Vec::new();

    for pass in 0..num_passes {
        let v = if pass == num_passes - 1 { values_per_category } else { 1 };
        tasks_per_pass.push(tasks.len());

        let prefix = format!("{}-intermediate{}", config.input_prefix, pass);
        let worker_tasks: Vec<PartitionTask> = tasks
            .into_iter()
            .enumerate()
            .map(|(i, t)| PartitionTask {
                keys_list: t.keys,
                prefix: prefix.clone(),
                category_stack: t.category_stack,
                values_per_category: v,
                worker_id: format!("w{i}"),
            })
            .collect();

        let worker_ctx = ctx.clone();
        let results = runner
            .map(worker_tasks, config.max_parallelism, move |task| {
                partition_worker::run(&worker_ctx, task).map_err(|e| TaskError::Failed {
                    message: e.to_string(),
                })
            })
            .await;

        // Regroup: explicit (stack, keys) pairs from every worker, merged
        // by stack (spec §9 redesign flag — no path parsing involved).
        let mut by_stack: BTreeMap<CategoryStack, Vec<String>> = BTreeMap::new();
        for result in results {
            let output = result.map_err(|e| CoordinatorError::PartitionTaskFailed {
                message: e.to_string(),
            })?;
            for (stack, keys) in output.produced {
                by_stack.entry(stack).or_default().extend(keys);
            }
        }

        internal_events::emit(ShufflePassCompleted {
            pass,
            task_count: by_stack.len(),
            values_per_category: v,
        });

        tasks = repartition(input_bytes, v, pass, by_stack);
    }

    tasks_per_pass.push(tasks.len());

    // Final prefix flip, sort by stack as a byte sequence, sequential id
    // assignment (spec §4.6 final steps).
    tasks.sort_by(|a, b| a.category_stack.cmp(&b.category_stack));
    // Zero-pass planning degenerates to a plain in-memory sort of the
    // original inputs: the category stack is empty either way, so the
    // sorter always compares the full 10-byte key (open question 1,
    // decided in DESIGN.md).
    let consider_last_byte_sorted = num_passes == 0 || values_per_category == 1;

    let sort_tasks: Vec<CategorySortTask> = tasks
        .into_iter()
        .enumerate()
        .map(|(id, t)| CategorySortTask {
            keys_list: t.keys,
            prefix: config.output_prefix.clone(),
            category_stack_depth: t.category_stack.depth(),
            consider_last_byte_sorted,
            id: id as u64,
        })
        .collect();

    let worker_ctx = ctx.clone();
    let results = runner
        .map(sort_tasks, config.max_parallelism, move |task| {
            category_sorter::run(&worker_ctx, task).map_err(|e| TaskError::Failed {
                message: e.to_string(),
            })
        })
        .await;

    let mut output_bytes = 0u64;
    let mut output_objects = 0usize;
    for result in results {
        let output = result.map_err(|e| CoordinatorError::CategorySortTaskFailed {
            message: e.to_string(),
        })?;
        output_bytes += output.byte_size;
        output_objects += 1;
    }

    if output_bytes != input_bytes {
        return Err(CoordinatorError::SizeMismatch {
            input_bytes,
            output_bytes,
        });
    }

    Ok(SortSummary {
        num_passes,
        values_per_category,
        tasks_per_pass,
        input_bytes,
        output_bytes,
        output_objects,
    })
}

/// Estimates each category's size as `input_size / ((256/v) * (pass + 1))`
/// (spec §4.6 step 3), computes `parts_per_category = ceil(size / buffer)`,
/// and splits each category's object list into that many contiguous,
/// near-equal sub-lists via the exact `array_split` semantics.
fn repartition(
    input_bytes: u64,
    v: u32,
    pass: u32,
    by_stack: BTreeMap<CategoryStack, Vec<String>>,
) -> Vec<Task> {
    let num_categories = (256 / v.max(1)) as u64;
    let denom = num_categories * (u64::from(pass) + 1);
    let estimated_category_size = if denom == 0 { input_bytes } else { input_bytes / denom };
    let parts_per_category = estimated_category_size
        .div_ceil(crate::config::BUFFER_SIZE_TO_CATEGORIZE)
        .max(1) as usize;

    let mean_task_count = if by_stack.is_empty() {
        0.0
    } else {
        by_stack.values().map(|v| v.len() as f64).sum::<f64>() / by_stack.len() as f64
    };

    let mut out = Vec::new();
    for (stack, keys) in by_stack {
        let task_count = keys.len();
        if mean_task_count > 0.0 && task_count as f64 > mean_task_count * 10.0 {
            internal_events::emit(CategorySkewDetected {
                category_stack: stack.to_path_string(),
                task_count,
                mean_task_count,
            });
        }
        for part in array_split(keys, parts_per_category) {
            if !part.is_empty() {
                out.push(Task {
                    category_stack: stack.clone(),
                    keys: part,
                });
            }
        }
    }
    out
}
