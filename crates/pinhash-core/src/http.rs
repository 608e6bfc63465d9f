//! Bounded HTTP fetching for upstream metadata and artifacts.
//!
//! Every request carries the configured timeout, and every response body is
//! read under the configured byte ceiling. Artifacts are hashed while
//! streaming so nothing larger than one chunk is buffered for them.

use std::time::Duration;

use bytes::BytesMut;
use futures::StreamExt;
use pinhash_schema::Sha256Digest;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::ResolverConfig;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("Malformed payload from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("Body of {url} exceeds {limit} bytes (got {size})")]
    TooLarge { url: String, size: u64, limit: u64 },
}

impl FetchError {
    /// Whether the failure was the size ceiling rather than the network.
    pub fn is_oversized(&self) -> bool {
        matches!(self, FetchError::TooLarge { .. })
    }

    /// Whether the request hit its timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Http(e) if e.is_timeout())
    }
}

/// Shared HTTP client with per-request timeout and body ceiling.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
    max_bytes: u64,
}

impl Fetcher {
    /// Build a fetcher from resolver configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: &ResolverConfig) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(crate::USER_AGENT).build()?;
        let config = config.clone().clamped();
        Ok(Self::with_client(
            client,
            config.request_timeout(),
            config.max_download_bytes,
        ))
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client, timeout: Duration, max_bytes: u64) -> Self {
        Self {
            client,
            timeout,
            max_bytes,
        }
    }

    /// Byte ceiling applied to every response body.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        let resp = self.client.get(url).timeout(self.timeout).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(resp)
    }

    /// Reject a response whose declared length is already over the ceiling.
    fn check_declared_length(&self, url: &str, resp: &Response) -> Result<(), FetchError> {
        match resp.content_length() {
            Some(size) if size > self.max_bytes => Err(FetchError::TooLarge {
                url: url.to_string(),
                size,
                limit: self.max_bytes,
            }),
            _ => Ok(()),
        }
    }

    async fn read_bounded(&self, url: &str, resp: Response) -> Result<BytesMut, FetchError> {
        self.check_declared_length(url, &resp)?;

        let mut body = BytesMut::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let size = (body.len() + chunk.len()) as u64;
            if size > self.max_bytes {
                return Err(FetchError::TooLarge {
                    url: url.to_string(),
                    size,
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    /// Fetch and decode a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, non-success status, an oversized
    /// body, or a body that does not match `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let resp = self.get(url).await?;
        let body = self.read_bounded(url, resp).await?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch a text document. Invalid UTF-8 is replaced, not rejected.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, non-success status, or an
    /// oversized body.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.get(url).await?;
        let body = self.read_bounded(url, resp).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Stream-download an artifact and compute its SHA256.
    ///
    /// The ceiling is checked twice: against the declared `Content-Length`
    /// before reading, and against the running byte count while reading. An
    /// oversized artifact yields [`FetchError::TooLarge`], never a digest of
    /// the bytes read so far.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, non-success status, or when the
    /// artifact exceeds the ceiling.
    pub async fn download_digest(&self, url: &str) -> Result<Sha256Digest, FetchError> {
        let resp = self.get(url).await?;
        self.check_declared_length(url, &resp)?;

        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            downloaded += chunk.len() as u64;
            if downloaded > self.max_bytes {
                return Err(FetchError::TooLarge {
                    url: url.to_string(),
                    size: downloaded,
                    limit: self.max_bytes,
                });
            }
            hasher.update(&chunk);
        }

        tracing::debug!("Hashed {downloaded} bytes from {url}");
        Ok(Sha256Digest::from_hasher(hasher))
    }
}
