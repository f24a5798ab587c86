// API request handlers

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        Query, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::response::{json_response, with_cors_methods};
use super::AppState;
use crate::error::ProxyError;
use crate::proxy::{GeminiProxyBody, ProxyRequest, UpstreamReply, DEFAULT_API_TYPE};

const GET_METHODS: &str = "GET, OPTIONS";

// Root endpoint
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let prefix = state.config.normalized_prefix();
    Json(json!({
        "message": "keyproxy",
        "endpoints": [
            format!("POST {}/gemini-proxy", prefix),
            format!("POST {}/proxy-api-request", prefix),
            format!("GET {}/get-api-key", prefix),
        ]
    }))
}

/// Proxy a Gemini `generateContent` call using the server's key.
///
/// Pre-flight `OPTIONS` requests are answered by the route's CORS layer.
pub async fn gemini_proxy(
    State(state): State<AppState>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if method != Method::POST {
        return ProxyError::MethodNotAllowed.into_response();
    }
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return error_response("gemini-proxy", rejection.into()),
    };

    match forward_gemini(&state, &body).await {
        Ok(reply) => relay(reply),
        Err(err) => error_response("gemini-proxy", err),
    }
}

async fn forward_gemini(state: &AppState, body: &[u8]) -> Result<UpstreamReply, ProxyError> {
    let request: GeminiProxyBody = serde_json::from_slice(body)?;

    let key = state.keys.resolve(DEFAULT_API_TYPE).ok_or_else(|| {
        ProxyError::MissingKey(
            "GEMINI_API_KEY not configured in environment variables".to_string(),
        )
    })?;

    tracing::info!(model = %request.model, "Proxying Gemini generateContent");
    let upstream = request.into_upstream(&state.config.gemini_base_url, key)?;
    state.upstream.post(upstream).await
}

/// Proxy a POST to a caller-chosen URL, appending the key for `apiType`.
pub async fn proxy_api_request(
    State(state): State<AppState>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if method != Method::POST {
        return ProxyError::MethodNotAllowed.into_response();
    }
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return error_response("proxy-api-request", rejection.into()),
    };

    match forward_generic(&state, &body).await {
        Ok(reply) => relay(reply),
        Err(err) => error_response("proxy-api-request", err),
    }
}

async fn forward_generic(state: &AppState, body: &[u8]) -> Result<UpstreamReply, ProxyError> {
    let request: ProxyRequest = serde_json::from_slice(body)?;
    let api_type = request.api_type().to_string();

    let key = state.keys.resolve(&api_type).ok_or_else(|| {
        ProxyError::MissingKey("API key not configured in environment variables".to_string())
    })?;

    tracing::info!(api_type = %api_type, "Proxying API request");
    let upstream = request.into_upstream(key)?;
    state.upstream.post(upstream).await
}

/// Unknown paths still answer with JSON and the origin header.
pub async fn not_found() -> Response {
    ProxyError::NotFound.into_response()
}

fn relay(reply: UpstreamReply) -> Response {
    json_response(reply.status, reply.body)
}

fn error_response(endpoint: &str, err: ProxyError) -> Response {
    if err.status().is_server_error() {
        tracing::error!(endpoint, "Proxy request failed: {}", err);
    } else {
        tracing::warn!(endpoint, "Rejected proxy request: {}", err);
    }
    err.into_response()
}

#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    #[serde(rename = "type")]
    pub api_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatus {
    pub has_key: bool,
    pub api_type: String,
}

/// Report whether a key is configured, never the key itself.
pub async fn get_api_key(
    State(state): State<AppState>,
    method: Method,
    query: Result<Query<KeyQuery>, QueryRejection>,
) -> Response {
    if method != Method::GET {
        return ProxyError::MethodNotAllowed.into_response();
    }
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return error_response("get-api-key", rejection.into()),
    };

    let api_type = query
        .api_type
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_API_TYPE.to_string());
    let status = KeyStatus {
        has_key: state.keys.has_key(&api_type),
        api_type,
    };

    match serde_json::to_vec(&status) {
        Ok(body) => with_cors_methods(json_response(StatusCode::OK, body), GET_METHODS),
        Err(err) => ProxyError::from(err).into_response(),
    }
}
