//! Record model, radix classifier, category-stack bookkeeping, and the
//! shuffle planner's pure arithmetic.
//!
//! This crate has no I/O and no notion of an object store or a task
//! runner — it is the part of `orasort` that a unit test or a benchmark
//! can exercise without a Tokio runtime.

pub mod category;
pub mod classifier;
pub mod planner;
pub mod record;

pub use category::CategoryStack;
pub use classifier::{classify, CategoryRange, ClassifyError};
pub use planner::{array_split, plan, PlannerError};
pub use record::{records, validate_record_buffer, Record, RecordSchemaError, KEY_SIZE, MAX_NUM_CATEGORIES, RECORD_SIZE};
