//! Object storage + HTTP transfer utilities for the buckets builder.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

pub const CRATE_NAME: &str = "duels-storage";

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// An object to be written to a store, with the HTTP metadata it is served with.
#[derive(Debug, Clone, Copy)]
pub struct PutObject<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub body: &'a [u8],
    pub content_type: &'a str,
    pub content_encoding: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub location: String,
    pub content_hash: String,
    pub byte_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub content_type: String,
    pub content_encoding: Option<String>,
    pub sha256: String,
    pub bytes: usize,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, object: PutObject<'_>) -> anyhow::Result<StoredObject>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object key {0:?} must be a relative path without parent components")]
    InvalidKey(String),
}

/// Filesystem-backed store laid out as `root/bucket/key`, with a
/// `key.meta.json` sidecar carrying the content headers.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        for part in [bucket, key] {
            let rel = Path::new(part);
            let clean = !part.is_empty()
                && rel
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)));
            if !clean {
                return Err(StoreError::InvalidKey(part.to_string()));
            }
        }
        Ok(self.root.join(bucket).join(key))
    }

    pub fn metadata_path(object_path: &Path) -> PathBuf {
        let mut name = object_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".meta.json");
        object_path.with_file_name(name)
    }

    /// Write bytes through a temp file in the target directory, then rename into place.
    async fn write_atomic(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
        let parent = path
            .parent()
            .with_context(|| format!("object path {} has no parent", path.display()))?;
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating object directory {}", parent.display()))?;

        let temp_path = parent.join(format!(".{}.{}.tmp", Uuid::new_v4(), bytes.len()));
        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .await
            .with_context(|| format!("opening temp object file {}", temp_path.display()))?;
        file.write_all(bytes)
            .await
            .with_context(|| format!("writing temp object file {}", temp_path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("flushing temp object file {}", temp_path.display()))?;
        drop(file);

        if let Err(err) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(err).with_context(|| {
                format!(
                    "atomically renaming temp object {} -> {}",
                    temp_path.display(),
                    path.display()
                )
            });
        }
        Ok(())
    }

    pub async fn read_metadata(&self, bucket: &str, key: &str) -> anyhow::Result<ObjectMetadata> {
        let path = Self::metadata_path(&self.object_path(bucket, key)?);
        let text = fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put_object(&self, object: PutObject<'_>) -> anyhow::Result<StoredObject> {
        let path = self.object_path(object.bucket, object.key)?;
        let content_hash = sha256_hex(object.body);
        let metadata = ObjectMetadata {
            content_type: object.content_type.to_string(),
            content_encoding: object.content_encoding.map(ToString::to_string),
            sha256: content_hash.clone(),
            bytes: object.body.len(),
        };

        Self::write_atomic(&path, object.body).await?;
        let meta_bytes =
            serde_json::to_vec_pretty(&metadata).context("serializing object metadata")?;
        Self::write_atomic(&Self::metadata_path(&path), &meta_bytes).await?;

        info!(path = %path.display(), bytes = object.body.len(), "stored object");
        Ok(StoredObject {
            location: path.display().to_string(),
            content_hash,
            byte_size: object.body.len(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retryable,
    NonRetryable,
}

pub fn classify_status(status: StatusCode) -> RetryDisposition {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

pub fn classify_reqwest_error(err: &reqwest::Error) -> RetryDisposition {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for_attempt(&self, attempt_index: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt_index as u32).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor);
        delay.min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub backoff: BackoffPolicy,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            user_agent: None,
            backoff: BackoffPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: StatusCode,
    pub final_url: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed after retries: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
}

/// Thin reqwest wrapper that retries transient failures with capped exponential backoff.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    backoff: BackoffPolicy,
}

impl HttpFetcher {
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().context("building reqwest client")?;
        Ok(Self {
            client,
            backoff: config.backoff,
        })
    }

    pub async fn fetch_bytes(&self, url: &str) -> Result<FetchedResponse, FetchError> {
        self.send_with_retry(|| self.client.get(url))
            .instrument(info_span!("http_fetch", url))
            .await
    }

    pub async fn put_bytes(
        &self,
        url: &str,
        body: &[u8],
        content_type: &str,
        content_encoding: Option<&str>,
    ) -> Result<FetchedResponse, FetchError> {
        self.send_with_retry(|| {
            let mut request = self
                .client
                .put(url)
                .header(CONTENT_TYPE, content_type)
                .body(body.to_vec());
            if let Some(encoding) = content_encoding {
                request = request.header(CONTENT_ENCODING, encoding);
            }
            request
        })
        .instrument(info_span!("http_put", url, bytes = body.len()))
        .await
    }

    async fn send_with_retry<F>(&self, build: F) -> Result<FetchedResponse, FetchError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match build().send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let final_url = resp.url().to_string();

                    if status.is_success() {
                        let body = resp.bytes().await?.to_vec();
                        return Ok(FetchedResponse {
                            status,
                            final_url,
                            body,
                        });
                    }

                    if classify_status(status) == RetryDisposition::Retryable
                        && attempt < self.backoff.max_retries
                    {
                        warn!(%status, attempt, "retrying http request");
                        tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(FetchError::HttpStatus {
                        status: status.as_u16(),
                        url: final_url,
                    });
                }
                Err(err) => {
                    if classify_reqwest_error(&err) == RetryDisposition::Retryable
                        && attempt < self.backoff.max_retries
                    {
                        warn!(error = %err, attempt, "retrying http request");
                        tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(FetchError::Request(err));
                }
            }
        }
    }
}

/// Store that PUTs objects to `base_url/bucket/key`.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    base_url: String,
    http: HttpFetcher,
}

impl HttpObjectStore {
    pub fn new(base_url: impl Into<String>, http: HttpFetcher) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            bucket.trim_matches('/'),
            key.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put_object(&self, object: PutObject<'_>) -> anyhow::Result<StoredObject> {
        let url = self.object_url(object.bucket, object.key);
        self.http
            .put_bytes(
                &url,
                object.body,
                object.content_type,
                object.content_encoding,
            )
            .await
            .with_context(|| format!("uploading {url}"))?;
        info!(%url, bytes = object.body.len(), "uploaded object");
        Ok(StoredObject {
            location: url,
            content_hash: sha256_hex(object.body),
            byte_size: object.body.len(),
        })
    }
}
