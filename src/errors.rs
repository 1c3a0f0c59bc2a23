//! Top-level error taxonomy. Every component keeps its own `snafu` enum;
//! `SortError` rolls them up so `main` has exactly one place to match on
//! for exit-code selection, mirroring the teacher's per-module-enums-plus-
//! one-roll-up convention.

use snafu::Snafu;

use crate::category_sorter::CategorySorterError;
use crate::config::ConfigError;
use crate::coordinator::CoordinatorError;
use crate::partition_worker::PartitionWorkerError;
use sort_core::{ClassifyError, PlannerError};
use sort_store::StoreError;

#[derive(Debug, Snafu)]
pub enum SortError {
    #[snafu(display("configuration error: {source}"))]
    Config { source: ConfigError },
    #[snafu(display("planner error: {source}"))]
    Planner { source: PlannerError },
    #[snafu(display("classifier error: {source}"))]
    Classify { source: ClassifyError },
    #[snafu(display("partition worker error: {source}"))]
    Partition { source: PartitionWorkerError },
    #[snafu(display("category sorter error: {source}"))]
    CategorySort { source: CategorySorterError },
    #[snafu(display("object store error: {source}"))]
    Store { source: StoreError },
    #[snafu(display("shuffle coordinator error: {source}"))]
    Coordinator { source: CoordinatorError },
}

impl SortError {
    /// Maps this error onto a process exit code from the `exitcode` crate,
    /// the way the teacher's binary entry point does for its own top-level
    /// error enum.
    pub fn exit_code(&self) -> exitcode::ExitCode {
        match self {
            SortError::Config { .. } | SortError::Planner { .. } => exitcode::CONFIG,
            SortError::Classify { .. } => exitcode::DATAERR,
            SortError::Store { .. }
            | SortError::Partition { .. }
            | SortError::CategorySort { .. }
            | SortError::Coordinator { .. } => exitcode::IOERR,
        }
    }
}
