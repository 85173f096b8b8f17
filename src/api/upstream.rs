//! Upstream client and exchange setup.
//!
//! A single [`UpstreamClient`] is created at startup and shared by every
//! request; its connection pool is the only cross-request resource of the
//! proxy pipeline.

use crate::core::config::UpstreamConfig;
use crate::core::error::{AppError, Result};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use std::time::Duration;

/// Body of an upstream response as a stream of chunks.
pub type UpstreamBody = BoxStream<'static, std::result::Result<Bytes, reqwest::Error>>;

/// Request to forward upstream.
#[derive(Debug)]
pub struct UpstreamRequest {
    pub method: Method,
    pub path: String,
    /// Raw query string, forwarded verbatim
    pub query: Option<String>,
    /// Already filtered inbound headers
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// An open upstream exchange: headers have arrived, the body has not been read.
pub struct UpstreamExchange {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: UpstreamBody,
}

/// Pooled client for the upstream completion API.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    api_base: String,
    authorization: HeaderValue,
    header_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let header_timeout = Duration::from_secs(config.request_timeout_secs);

        // No overall timeout: it would also cut off long streamed bodies.
        // Connect + response headers are bounded in `open` instead.
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_ssl)
            .connect_timeout(header_timeout)
            .pool_max_idle_per_host(100)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.api_key))?;
        authorization.set_sensitive(true);

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            authorization,
            header_timeout,
        })
    }

    /// Full upstream URL for a path and raw query string.
    pub fn url_for(&self, path: &str, query: Option<&str>) -> String {
        match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{}{}?{}", self.api_base, path, query),
            None => format!("{}{}", self.api_base, path),
        }
    }

    /// Send the request and wait for the upstream response headers.
    ///
    /// The body is left unread; the returned exchange owns it.
    pub async fn open(&self, request: UpstreamRequest) -> Result<UpstreamExchange> {
        let url = self.url_for(&request.path, request.query.as_deref());

        let mut builder = self
            .http
            .request(request.method, &url)
            .headers(request.headers)
            .header(header::AUTHORIZATION, self.authorization.clone());
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        tracing::debug!(url = %url, "Opening upstream exchange");

        let response = tokio::time::timeout(self.header_timeout, builder.send())
            .await
            .map_err(|_| AppError::Timeout)??;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes_stream().boxed();

        Ok(UpstreamExchange {
            status,
            headers,
            body,
        })
    }
}
