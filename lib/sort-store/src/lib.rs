//! The object-store interface the shuffle coordinator and its workers
//! consume (spec §6.2), plus the backends that implement it.
//!
//! Workers only ever need whole-object, range-less reads and atomic
//! whole-object writes (spec §1, §6), so the trait is deliberately small:
//! no seeking, no partial ranges, no overwrite.

pub mod local;
pub mod memory;

#[cfg(feature = "aws-s3")]
pub mod s3;

use std::io::{Read, Write};

use async_trait::async_trait;

/// Size metadata for one object, as returned by [`ObjectStore::list_objects`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
}

/// Errors surfaced by an [`ObjectStore`] implementation.
///
/// Every variant is an I/O error in spec terms (§7): fatal for the calling
/// task, with no in-task retry. Backends attach enough context to log a
/// useful `tracing::error!` line at the call site.
#[derive(Debug, snafu::Snafu)]
pub enum StoreError {
    #[snafu(display("failed to read object {key}: {source}"))]
    Read { key: String, source: std::io::Error },
    #[snafu(display("failed to write object {key}: {source}"))]
    Write { key: String, source: std::io::Error },
    #[snafu(display("failed to list objects under prefix {prefix}: {source}"))]
    List { prefix: String, source: std::io::Error },
    #[snafu(display("object {key} already exists and may not be overwritten"))]
    AlreadyExists { key: String },
    #[snafu(display("backend error: {message}"))]
    Backend { message: String },
}

/// A write handle for one object. Nothing is visible to readers until
/// [`ObjectWriter::finish`] is called; this is what the spec means by
/// "atomic on close" (§6).
pub trait ObjectWriter: Write + Send {
    /// Commits the write. Each backend decides what "atomic" means for it:
    /// a single `PutObject` for S3, a write-then-rename for the local
    /// filesystem, a single map insert for the in-memory store.
    fn finish(self: Box<Self>) -> Result<(), StoreError>;
}

/// The object-store interface consumed by the coordinator and its workers.
///
/// `open_read`/`open_write` are deliberately synchronous (`std::io`, not
/// `tokio::io`): workers run under `spawn_blocking` (spec §5, §9) and do
/// blocking I/O against the store from that dedicated thread. `list_objects`
/// and `list_keys` are async because the coordinator calls them directly
/// from its own async task, between pass barriers, never from a worker.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StoreError>;

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .list_objects(prefix)
            .await?
            .into_iter()
            .map(|o| o.key)
            .collect())
    }

    /// Opens `key` for sequential, whole-object reading.
    fn open_read(&self, key: &str) -> Result<Box<dyn Read + Send>, StoreError>;

    /// Opens `key` for writing. `multipart` must be `false` for every
    /// intermediate object (spec §4.3): a torn multipart upload would
    /// corrupt the ordering invariant the whole shuffle depends on.
    fn open_write(&self, key: &str, multipart: bool) -> Result<Box<dyn ObjectWriter>, StoreError>;
}
