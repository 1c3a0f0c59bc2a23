//! The production `ObjectStore` backend, over `aws-sdk-s3`.
//!
//! Reads fetch the whole object eagerly (the spec only ever needs
//! range-less, whole-object reads, §1/§6) and writes buffer in memory
//! until [`ObjectWriter::finish`] issues a single `PutObject` — or, when
//! `multipart` is requested, drives the SDK's multipart upload helper.
//! `multipart` must never be set for intermediate objects (spec §4.3): a
//! torn multipart upload would corrupt the shuffle's ordering invariant.

use std::io::{self, Cursor, Read, Write};

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tokio::runtime::Handle;

use crate::{ObjectMeta, ObjectStore, ObjectWriter, StoreError};

/// Multipart uploads below this size are just as cheap as a single
/// `PutObject`; the helper only kicks in above it.
const MULTIPART_THRESHOLD: usize = 8 * 1024 * 1024;

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    runtime: Handle,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>, runtime: Handle) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            runtime,
        }
    }

    /// Builds a store from the ambient AWS environment (profile, env vars,
    /// IMDS, ...), matching how the teacher's AWS-backed sinks construct
    /// their clients via `aws-config`.
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::load_from_env().await;
        let client = Client::new(&config);
        Self::new(client, bucket, Handle::current())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StoreError> {
        let mut out = Vec::new();
        let mut continuation_token = None;
        loop {
            let mut req = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(token) = continuation_token.take() {
                req = req.continuation_token(token);
            }
            let resp = req.send().await.map_err(|e| StoreError::Backend {
                message: format!("list_objects_v2 failed for prefix {prefix}: {e}"),
            })?;
            for obj in resp.contents() {
                if let Some(key) = obj.key() {
                    out.push(ObjectMeta {
                        key: key.to_string(),
                        size: obj.size().unwrap_or(0).max(0) as u64,
                    });
                }
            }
            if resp.is_truncated().unwrap_or(false) {
                continuation_token = resp.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }
        Ok(out)
    }

    fn open_read(&self, key: &str) -> Result<Box<dyn Read + Send>, StoreError> {
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        let key_owned = key.to_string();
        let bytes = self
            .runtime
            .block_on(async move {
                let resp = client.get_object().bucket(bucket).key(&key_owned).send().await?;
                resp.body.collect().await
            })
            .map_err(|e| StoreError::Read {
                key: key.to_string(),
                source: io::Error::other(e.to_string()),
            })?
            .into_bytes();
        Ok(Box::new(Cursor::new(bytes.to_vec())))
    }

    fn open_write(&self, key: &str, multipart: bool) -> Result<Box<dyn ObjectWriter>, StoreError> {
        Ok(Box::new(S3Writer {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            key: key.to_string(),
            multipart,
            buf: Vec::new(),
            runtime: self.runtime.clone(),
        }))
    }
}

struct S3Writer {
    client: Client,
    bucket: String,
    key: String,
    multipart: bool,
    buf: Vec<u8>,
    runtime: Handle,
}

impl Write for S3Writer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ObjectWriter for S3Writer {
    fn finish(self: Box<Self>) -> Result<(), StoreError> {
        let S3Writer {
            client,
            bucket,
            key,
            multipart,
            buf,
            runtime,
        } = *self;

        runtime
            .block_on(async move {
                if multipart && buf.len() > MULTIPART_THRESHOLD {
                    put_multipart(&client, &bucket, &key, buf).await
                } else {
                    client
                        .put_object()
                        .bucket(&bucket)
                        .key(&key)
                        .body(ByteStream::from(buf))
                        .send()
                        .await
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                }
            })
            .map_err(|message| StoreError::Write {
                key,
                source: io::Error::other(message),
            })
    }
}

async fn put_multipart(
    client: &Client,
    bucket: &str,
    key: &str,
    data: Vec<u8>,
) -> Result<(), String> {
    let create = client
        .create_multipart_upload()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let upload_id = create.upload_id().ok_or("missing upload id")?.to_string();

    let mut parts = Vec::new();
    for (i, chunk) in data.chunks(MULTIPART_THRESHOLD).enumerate() {
        let part_number = (i + 1) as i32;
        let uploaded = client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(&upload_id)
            .part_number(part_number)
            .body(ByteStream::from(chunk.to_vec()))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        parts.push(
            aws_sdk_s3::types::CompletedPart::builder()
                .e_tag(uploaded.e_tag().unwrap_or_default())
                .part_number(part_number)
                .build(),
        );
    }

    client
        .complete_multipart_upload()
        .bucket(bucket)
        .key(key)
        .upload_id(&upload_id)
        .multipart_upload(
            aws_sdk_s3::types::CompletedMultipartUpload::builder()
                .set_parts(Some(parts))
                .build(),
        )
        .send()
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
}
