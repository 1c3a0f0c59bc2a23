//! A filesystem-rooted object store for local development runs and
//! integration tests. Object keys map directly onto relative paths under
//! a root directory; "multipart" is a no-op distinction here since a
//! write-then-rename is already atomic on a local filesystem.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::{ObjectMeta, ObjectStore, ObjectWriter, StoreError};

#[derive(Clone)]
pub struct LocalFsObjectStore {
    root: PathBuf,
}

impl LocalFsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ObjectStore for LocalFsObjectStore {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StoreError> {
        let root = self.root.clone();
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || list_objects_blocking(&root, &prefix))
            .await
            .map_err(|e| StoreError::Backend {
                message: format!("list task panicked: {e}"),
            })?
    }

    fn open_read(&self, key: &str) -> Result<Box<dyn Read + Send>, StoreError> {
        let path = self.path_for(key);
        let file = File::open(&path).map_err(|source| StoreError::Read {
            key: key.to_string(),
            source,
        })?;
        Ok(Box::new(file))
    }

    fn open_write(&self, key: &str, _multipart: bool) -> Result<Box<dyn ObjectWriter>, StoreError> {
        let final_path = self.path_for(key);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                key: key.to_string(),
                source,
            })?;
        }
        let tmp_path = final_path.with_extension("tmp-write");
        let file = File::create(&tmp_path).map_err(|source| StoreError::Write {
            key: key.to_string(),
            source,
        })?;
        Ok(Box::new(LocalFileWriter {
            key: key.to_string(),
            tmp_path,
            final_path,
            file,
        }))
    }
}

fn list_objects_blocking(root: &Path, prefix: &str) -> Result<Vec<ObjectMeta>, StoreError> {
    let mut out = Vec::new();
    if root.exists() {
        walk(root, root, &mut out)?;
    }

    out.retain(|o: &ObjectMeta| o.key.starts_with(prefix));
    out.sort_by(|a, b| a.key.cmp(&b.key));

    debug!(count = out.len(), prefix, "listed local objects");
    Ok(out)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<ObjectMeta>) -> Result<(), StoreError> {
    for entry in fs::read_dir(dir).map_err(|source| StoreError::List {
        prefix: dir.display().to_string(),
        source,
    })? {
        let entry = entry.map_err(|source| StoreError::List {
            prefix: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) != Some("tmp-write") {
            let meta = entry.metadata().map_err(|source| StoreError::List {
                prefix: path.display().to_string(),
                source,
            })?;
            let key = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/");
            out.push(ObjectMeta { key, size: meta.len() });
        }
    }
    Ok(())
}

struct LocalFileWriter {
    key: String,
    tmp_path: PathBuf,
    final_path: PathBuf,
    file: File,
}

impl io::Write for LocalFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl ObjectWriter for LocalFileWriter {
    fn finish(mut self: Box<Self>) -> Result<(), StoreError> {
        use std::io::Write as _;
        self.file.flush().map_err(|source| StoreError::Write {
            key: self.key.clone(),
            source,
        })?;
        fs::rename(&self.tmp_path, &self.final_path).map_err(|source| StoreError::Write {
            key: self.key.clone(),
            source,
        })
    }
}
