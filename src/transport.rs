//! The HTTP boundary. Anything that can perform a GET and hand back the status
//! and body text can serve as a [`Transport`].

use crate::MeteosourceError;
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use thiserror::Error;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// `None` when the body could not be read.
    pub body: Option<String>,
}

/// The request never produced an HTTP response (DNS, connect, timeout, ...).
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError>;
}

/// Default [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, MeteosourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("meteosource-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MeteosourceError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TransportError(e.without_url().to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.ok();
        Ok(RawResponse { status, body })
    }
}
