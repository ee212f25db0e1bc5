//! Fetching: one HTTP GET per link, body exposed as a stream of chunks.
//!
//! [`Fetcher`] is the seam between the pipeline and the network. The
//! orchestrator is generic over it, so tests hand in a stub that serves canned
//! bytes instead of opening sockets. [`HttpFetcher`] is the production
//! implementation on top of `reqwest`.
//!
//! A fetcher reports the status code as-is and never retries. Deciding that
//! only `200` counts as content is the orchestrator's job.

use crate::error::{LinkError, LocalizeError};
use futures::stream::{self, Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

/// Response body as a stream of byte chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, LinkError>> + Send>>;

/// Status line plus a not-yet-consumed body.
pub struct FetchResponse {
    pub status: u16,
    pub body: BodyStream,
}

impl FetchResponse {
    /// Build a response whose body is a single in-memory chunk.
    pub fn from_bytes(status: u16, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        Self {
            status,
            body: Box::pin(stream::once(async move { Ok::<_, LinkError>(bytes) })),
        }
    }

    /// Drain the body into one buffer.
    pub async fn into_bytes(self) -> Result<Vec<u8>, LinkError> {
        let mut body = self.body;
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("body", &"<stream>")
            .finish()
    }
}

/// Retrieve a link over the network.
///
/// Transport faults are returned as [`LinkError`]; any HTTP status, including
/// errors, is a successful fetch from this trait's point of view.
pub trait Fetcher {
    fn fetch(&self, link: &str) -> impl Future<Output = Result<FetchResponse, LinkError>> + Send;
}

/// `reqwest`-backed fetcher with a streamed body.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: Option<u64>,
}

impl HttpFetcher {
    /// Build a client. With `timeout_secs = None` the transport default
    /// applies, which is no timeout.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, LocalizeError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| LocalizeError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// Wrap an existing client (custom proxy, headers, TLS roots …).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout_secs: None,
        }
    }

    fn map_error(&self, link: &str, e: reqwest::Error) -> LinkError {
        match self.timeout_secs {
            Some(secs) if e.is_timeout() => LinkError::Timeout {
                link: link.to_string(),
                secs,
            },
            _ => LinkError::Fetch {
                link: link.to_string(),
                reason: error_chain(&e),
            },
        }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, link: &str) -> Result<FetchResponse, LinkError> {
        let response = self
            .client
            .get(link)
            .send()
            .await
            .map_err(|e| self.map_error(link, e))?;

        let status = response.status().as_u16();
        debug!("GET {} → {}", link, status);

        let owned_link = link.to_string();
        let body = response.bytes_stream().map(move |chunk| {
            chunk.map(|b| b.to_vec()).map_err(|e| LinkError::Body {
                link: owned_link.clone(),
                reason: error_chain(&e),
            })
        });

        Ok(FetchResponse {
            status,
            body: Box::pin(body),
        })
    }
}

/// `reqwest` errors wrap the interesting part (DNS, TLS, reset) as a source;
/// flatten the chain so the console line says what actually happened.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        msg.push_str(": ");
        msg.push_str(&inner.to_string());
        source = inner.source();
    }
    msg
}
