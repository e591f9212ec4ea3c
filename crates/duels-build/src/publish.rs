//! Serialization, compression and upload of the published bucket list.

use std::io::Write;

use anyhow::{Context, Result};
use duels_core::BucketInfo;
use duels_storage::{ObjectStore, PutObject, StoredObject};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

pub const DEFAULT_BUCKET: &str = "static.zerotoheroes.com";
pub const DEFAULT_OBJECT_KEY: &str = "api/duels/duels-buckets.gz.json";
pub const CONTENT_TYPE: &str = "application/json";
pub const CONTENT_ENCODING: &str = "gzip";

/// JSON with four-space indentation.
pub fn to_indented_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .context("serializing buckets")?;
    Ok(out)
}

pub fn gzip_best(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(bytes).context("compressing buckets")?;
    encoder.finish().context("finishing gzip stream")
}

pub struct Publisher {
    store: Box<dyn ObjectStore>,
    bucket: String,
    key: String,
}

impl Publisher {
    pub fn new(
        store: Box<dyn ObjectStore>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub async fn publish(&self, buckets: &[BucketInfo]) -> Result<StoredObject> {
        let json = to_indented_json(&buckets)?;
        let gzipped = gzip_best(&json)?;
        self.store
            .put_object(PutObject {
                bucket: &self.bucket,
                key: &self.key,
                body: &gzipped,
                content_type: CONTENT_TYPE,
                content_encoding: Some(CONTENT_ENCODING),
            })
            .await
            .with_context(|| format!("storing {}/{}", self.bucket, self.key))
    }
}
