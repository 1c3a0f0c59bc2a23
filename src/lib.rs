//! External distributed radix sort over object storage.
//!
//! The pure, I/O-free algorithmic core (record model, radix classifier,
//! category stacks, shuffle planner) lives in [`sort_core`]; the object
//! store abstraction lives in [`sort_store`]; the bounded-parallelism task
//! runner lives in [`sort_runtime`]. This crate wires those three together
//! into the six components the shuffle actually runs: the streaming
//! partition worker, the category sorter worker, and the shuffle
//! coordinator that drives both, plus the CLI/config/logging shell around
//! them.

pub mod category_sorter;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod internal_events;
pub mod partition_worker;
pub mod worker_context;

pub use errors::SortError;
