// Proxy module - request shapes and upstream request construction

pub mod keys;
pub mod upstream;

use std::collections::HashMap;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::error::ProxyError;
pub use keys::ApiKeys;
pub use upstream::{HttpUpstream, Upstream, UpstreamReply, UpstreamRequest};

pub const DEFAULT_API_TYPE: &str = "gemini";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiType {
    Gemini,
    Seedream,
    Freepik,
}

impl ApiType {
    /// Case-sensitive; unknown tokens yield `None`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "gemini" => Some(Self::Gemini),
            "seedream" => Some(Self::Seedream),
            "freepik" => Some(Self::Freepik),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Seedream => "seedream",
            Self::Freepik => "freepik",
        }
    }
}

/// Body of the fixed-upstream Gemini proxy.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiProxyBody {
    pub model: String,
    #[serde(default)]
    pub contents: Option<Value>,
    #[serde(default)]
    pub generation_config: Option<Value>,
}

/// Body of the generic proxy.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(default)]
    pub api_type: Option<String>,
    pub url: String,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub headers: HashMap<String, String>,
}

/// `"headers": null` means no extra headers.
fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ProxyRequest {
    pub fn api_type(&self) -> &str {
        self.api_type.as_deref().unwrap_or(DEFAULT_API_TYPE)
    }
}

/// Generation parameters used when the caller sends none.
pub fn default_generation_config() -> Value {
    json!({
        "temperature": 1,
        "topK": 40,
        "topP": 0.95,
        "maxOutputTokens": 8192
    })
}

/// Append `key` as a query parameter, keeping any existing query string.
pub fn append_key(url: &str, key: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}key={}", url, separator, urlencoding::encode(key))
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

impl GeminiProxyBody {
    pub fn into_upstream(self, base_url: &str, key: &str) -> Result<UpstreamRequest, ProxyError> {
        let url = format!(
            "{}/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            self.model
        );

        let generation_config = match self.generation_config {
            Some(Value::Null) | None => default_generation_config(),
            Some(config) => config,
        };

        let mut payload = serde_json::Map::new();
        if let Some(contents) = self.contents {
            payload.insert("contents".to_string(), contents);
        }
        payload.insert("generationConfig".to_string(), generation_config);

        let body = serde_json::to_vec(&Value::Object(payload))?;

        Ok(UpstreamRequest {
            url: append_key(&url, key),
            headers: json_headers(),
            body: Some(Bytes::from(body)),
        })
    }
}

impl ProxyRequest {
    pub fn into_upstream(self, key: &str) -> Result<UpstreamRequest, ProxyError> {
        let mut headers = json_headers();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ProxyError::InvalidHeader(format!("Invalid header name {:?}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ProxyError::InvalidHeader(format!("Invalid value for header {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        let body = match self.body {
            Some(body) => Some(Bytes::from(serde_json::to_vec(&body)?)),
            None => None,
        };

        Ok(UpstreamRequest {
            url: append_key(&self.url, key),
            headers,
            body,
        })
    }
}
