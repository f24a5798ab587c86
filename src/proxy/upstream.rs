// Outbound HTTP to the generative API

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;

use crate::error::ProxyError;

/// A single outbound POST. `url` carries the key and must not be logged.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl UpstreamRequest {
    /// URL with the query string removed, safe for logs.
    pub fn redacted_url(&self) -> &str {
        self.url.split('?').next().unwrap_or_default()
    }
}

/// Whatever the upstream answered, untouched.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: Bytes,
}

#[async_trait]
pub trait Upstream: Send + Sync {
    async fn post(&self, request: UpstreamRequest) -> Result<UpstreamReply, ProxyError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpUpstream {
    http_client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn post(&self, request: UpstreamRequest) -> Result<UpstreamReply, ProxyError> {
        let upstream = request.redacted_url().to_string();
        tracing::debug!(upstream = %upstream, "Forwarding request upstream");

        let mut builder = self.http_client.post(&request.url).headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        // reqwest errors may embed the full URL
        let response = builder
            .send()
            .await
            .map_err(|e| ProxyError::Network(e.without_url()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProxyError::Network(e.without_url()))?;

        if status.is_success() {
            tracing::debug!(upstream = %upstream, status = status.as_u16(), "Upstream replied");
        } else {
            tracing::warn!(upstream = %upstream, status = status.as_u16(), "Upstream returned error status");
        }

        Ok(UpstreamReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_url_drops_query() {
        let request = UpstreamRequest {
            url: "https://api.example.com/v1/run?mode=fast&key=secret".to_string(),
            headers: HeaderMap::new(),
            body: None,
        };
        assert_eq!(request.redacted_url(), "https://api.example.com/v1/run");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_network_error() {
        let request = UpstreamRequest {
            url: "http://127.0.0.1:1/run?key=secret".to_string(),
            headers: HeaderMap::new(),
            body: Some(Bytes::from_static(b"{}")),
        };
        let upstream = HttpUpstream {
            http_client: reqwest::Client::builder().no_proxy().build().unwrap(),
        };
        let err = upstream.post(request).await.unwrap_err();
        assert!(matches!(err, ProxyError::Network(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("secret"));
    }
}
