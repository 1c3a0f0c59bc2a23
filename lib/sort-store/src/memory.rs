//! An in-process object store backed by a `DashMap`, for fast unit and
//! property tests. Grounded on the same "small, swappable test double"
//! pattern the teacher uses for its mock sources and sinks.

use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::{ObjectMeta, ObjectStore, ObjectWriter, StoreError};

#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<DashMap<String, Bytes>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes across every object currently stored, used by tests that
    /// check the size-conservation invariant (spec §8, invariant 2).
    pub fn total_bytes(&self) -> u64 {
        self.objects.iter().map(|e| e.value().len() as u64).sum()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StoreError> {
        let mut out: Vec<ObjectMeta> = self
            .objects
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| ObjectMeta {
                key: e.key().clone(),
                size: e.value().len() as u64,
            })
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }

    fn open_read(&self, key: &str) -> Result<Box<dyn Read + Send>, StoreError> {
        let data = self
            .objects
            .get(key)
            .map(|e| e.value().clone())
            .ok_or_else(|| StoreError::Read {
                key: key.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such object"),
            })?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn open_write(&self, key: &str, _multipart: bool) -> Result<Box<dyn ObjectWriter>, StoreError> {
        Ok(Box::new(MemoryWriter {
            key: key.to_string(),
            buf: Vec::new(),
            objects: Arc::clone(&self.objects),
        }))
    }
}

struct MemoryWriter {
    key: String,
    buf: Vec<u8>,
    objects: Arc<DashMap<String, Bytes>>,
}

impl Write for MemoryWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ObjectWriter for MemoryWriter {
    fn finish(self: Box<Self>) -> Result<(), StoreError> {
        self.objects.insert(self.key, Bytes::from(self.buf));
        Ok(())
    }
}
