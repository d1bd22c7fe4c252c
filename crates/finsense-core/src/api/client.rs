//! The authenticated request gateway.
//!
//! Every backend call goes through `ApiClient::request`, which:
//! - fails with `ApiError::NoSession` before any I/O when no token is stored,
//! - resolves short paths against the configured API base,
//! - attaches `Authorization: Bearer <token>` and a JSON content type,
//! - clears the session and fails with `ApiError::Unauthorized` on a 401.
//!
//! Any other status, success or not, comes back as a plain `ApiResponse`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::auth::SessionStore;
use crate::config::Config;

use super::transport::{ApiResponse, OutboundRequest, ReqwestTransport, Transport};
use super::ApiError;

/// Content type sent unless the caller overrides it
const JSON_CONTENT_TYPE: &str = "application/json";

/// Per-call options: method, extra headers and an optional body.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a header. Applied after the defaults, so it may replace them.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<B: Serialize + ?Sized>(self, value: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_vec(value)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode body: {}", e)))?;
        Ok(self.body(body))
    }
}

/// True when `target` starts with a URL scheme such as `https://`.
fn is_absolute_url(target: &str) -> bool {
    let Some((scheme, _)) = target.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Gateway for authenticated calls to the FinSense API.
/// Clone is cheap - the transport and session store are shared.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    base_url: String,
}

impl ApiClient {
    /// Create a client that talks HTTP through reqwest.
    pub fn new(base_url: impl Into<String>, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(None)?;
        Ok(Self::with_transport(base_url, session, Arc::new(transport)))
    }

    /// Create a client from loaded configuration (base URL and timeout).
    pub fn from_config(config: &Config, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let timeout = config.request_timeout_secs.map(Duration::from_secs);
        let transport = ReqwestTransport::new(timeout)?;
        Ok(Self::with_transport(config.api_base_url(), session, Arc::new(transport)))
    }

    pub fn with_transport(
        base_url: impl Into<String>,
        session: Arc<dyn SessionStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            transport,
            session,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Absolute targets are used verbatim; anything else is appended to the
    /// base URL as-is.
    pub fn resolve_url(&self, target: &str) -> String {
        if is_absolute_url(target) {
            target.to_string()
        } else {
            format!("{}{}", self.base_url, target)
        }
    }

    fn build_headers(token: &str, extra: &[(String, String)]) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidRequest("Session token is not a valid header value".to_string()))?,
        );

        for (name, value) in extra {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidRequest(format!("Invalid header name: {}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::InvalidRequest(format!("Invalid value for header {}", name)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    /// Send an authenticated request and return the raw response.
    pub async fn request(&self, target: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        let token = self.session.active_token().ok_or_else(|| {
            debug!(path = target, "No session token, refusing to send request");
            ApiError::NoSession
        })?;

        let url = self.resolve_url(target);
        let headers = Self::build_headers(&token, &options.headers)?;

        debug!(method = %options.method, url = %url, "Sending request");
        let response = self
            .transport
            .send(OutboundRequest {
                method: options.method,
                url: url.clone(),
                headers,
                body: options.body,
            })
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(url = %url, "Received 401, clearing session");
            if let Err(e) = self.session.clear_session() {
                error!(error = %e, "Failed to clear session after 401");
            }
            return Err(ApiError::Unauthorized);
        }

        debug!(url = %url, status = response.status().as_u16(), "Response received");
        Ok(response)
    }

    pub async fn get(&self, target: &str) -> Result<ApiResponse, ApiError> {
        self.request(target, RequestOptions::new()).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, target: &str, body: &B) -> Result<ApiResponse, ApiError> {
        let options = RequestOptions::new().method(Method::POST).json(body)?;
        self.request(target, options).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(&self, target: &str, body: &B) -> Result<ApiResponse, ApiError> {
        let options = RequestOptions::new().method(Method::PUT).json(body)?;
        self.request(target, options).await
    }

    pub async fn delete(&self, target: &str) -> Result<ApiResponse, ApiError> {
        self.request(target, RequestOptions::new().method(Method::DELETE)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::RecordingTransport;
    use crate::auth::MemorySessionStore;

    const BASE: &str = "https://api.x";

    fn client_with(store: Arc<MemorySessionStore>, transport: Arc<RecordingTransport>) -> ApiClient {
        ApiClient::with_transport(BASE, store, transport)
    }

    #[test]
    fn test_is_absolute_url() {
        assert!(is_absolute_url("https://api.x/budget"));
        assert!(is_absolute_url("http://localhost:8000/profile"));
        assert!(is_absolute_url("HTTP://EXAMPLE.COM"));
        assert!(is_absolute_url("svn+ssh://host/repo"));

        assert!(!is_absolute_url("/budget"));
        assert!(!is_absolute_url("budget"));
        assert!(!is_absolute_url("/redirect?to=https://evil"));
        assert!(!is_absolute_url("://missing-scheme"));
        assert!(!is_absolute_url("1http://digits-first"));
    }

    #[test]
    fn test_resolve_url() {
        let client = client_with(Arc::new(MemorySessionStore::new()), RecordingTransport::new());
        assert_eq!(client.resolve_url("/budget"), "https://api.x/budget");
        assert_eq!(client.resolve_url("budget"), "https://api.xbudget"); // Plain concatenation
        assert_eq!(client.resolve_url("https://other.host/x"), "https://other.host/x");
        assert_eq!(
            client.resolve_url("/transactions?type=expense"),
            "https://api.x/transactions?type=expense"
        );
    }

    #[tokio::test]
    async fn test_request_resolves_relative_path_and_attaches_token() {
        let store = Arc::new(MemorySessionStore::with_token("abc", None));
        let transport = RecordingTransport::new();
        let client = client_with(store, transport.clone());

        let response = client.request("/budget", RequestOptions::new()).await.unwrap();
        assert!(response.is_success());

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://api.x/budget");
        assert_eq!(sent[0].method, Method::GET);
        assert_eq!(sent[0].headers[header::AUTHORIZATION], "Bearer abc");
        assert_eq!(sent[0].headers[header::CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_request_without_token_makes_no_call() {
        let transport = RecordingTransport::new();
        let client = client_with(Arc::new(MemorySessionStore::new()), transport.clone());

        for target in ["/profile", "https://api.x/budget", ""] {
            let err = client.request(target, RequestOptions::new()).await.unwrap_err();
            assert!(matches!(err, ApiError::NoSession));
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_request_with_empty_token_makes_no_call() {
        let transport = RecordingTransport::new();
        let client = client_with(Arc::new(MemorySessionStore::with_token("", None)), transport.clone());

        let err = client.get("/profile").await.unwrap_err();
        assert!(matches!(err, ApiError::NoSession));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_absolute_target_skips_base() {
        let transport = RecordingTransport::new();
        let client = client_with(Arc::new(MemorySessionStore::with_token("abc", None)), transport.clone());

        client.get("http://localhost:9000/budget").await.unwrap();
        assert_eq!(transport.requests()[0].url, "http://localhost:9000/budget");
    }

    #[tokio::test]
    async fn test_caller_headers_merge_with_defaults() {
        let transport = RecordingTransport::new();
        let client = client_with(Arc::new(MemorySessionStore::with_token("abc", None)), transport.clone());

        let options = RequestOptions::new()
            .header("X-Request-Id", "42")
            .header("Accept", "application/json");
        client.request("/budgets", options).await.unwrap();

        let sent = transport.requests().remove(0);
        assert_eq!(sent.headers[header::AUTHORIZATION], "Bearer abc");
        assert_eq!(sent.headers["x-request-id"], "42");
        assert_eq!(sent.headers[header::ACCEPT], "application/json");
    }

    #[tokio::test]
    async fn test_caller_may_override_default_headers() {
        let transport = RecordingTransport::new();
        let client = client_with(Arc::new(MemorySessionStore::with_token("abc", None)), transport.clone());

        let options = RequestOptions::new()
            .header("Content-Type", "text/plain")
            .header("Authorization", "Bearer other");
        client.request("/notes", options).await.unwrap();

        let sent = transport.requests().remove(0);
        assert_eq!(sent.headers[header::CONTENT_TYPE], "text/plain");
        assert_eq!(sent.headers[header::AUTHORIZATION], "Bearer other");
        assert_eq!(sent.headers.get_all(header::AUTHORIZATION).iter().count(), 1);
    }

    #[tokio::test]
    async fn test_method_and_body_are_forwarded() {
        let transport = RecordingTransport::new();
        let client = client_with(Arc::new(MemorySessionStore::with_token("abc", None)), transport.clone());

        let body = serde_json::json!({"month": 3, "year": 2025, "amount": 1500.0});
        client.post_json("/budget", &body).await.unwrap();

        let sent = transport.requests().remove(0);
        assert_eq!(sent.method, Method::POST);
        let decoded: serde_json::Value = serde_json::from_slice(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(decoded, body);
    }

    #[tokio::test]
    async fn test_401_clears_session_regardless_of_body() {
        for body in ["", r#"{"detail":"Token expired"}"#, "<html>oops</html>"] {
            let store = Arc::new(MemorySessionStore::with_token("abc", Some("Asha")));
            let transport = RecordingTransport::new();
            transport.respond(401, body);
            let client = client_with(store.clone(), transport.clone());

            let err = client.get("/dashboard/summary").await.unwrap_err();
            assert!(matches!(err, ApiError::Unauthorized));
            assert_eq!(store.token(), None);
            assert_eq!(store.display_name(), None);
            assert_eq!(transport.call_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_calls_after_401_fail_fast() {
        let store = Arc::new(MemorySessionStore::with_token("abc", None));
        let transport = RecordingTransport::new();
        transport.respond(401, "");
        let client = client_with(store, transport.clone());

        assert!(matches!(client.get("/profile").await, Err(ApiError::Unauthorized)));
        assert!(matches!(client.get("/profile").await, Err(ApiError::NoSession)));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_business_errors_are_returned_not_raised() {
        let store = Arc::new(MemorySessionStore::with_token("abc", None));
        let transport = RecordingTransport::new();
        transport.respond(404, r#"{"detail":"not found"}"#);
        let client = client_with(store.clone(), transport);

        let response = client.get("/budget/current").await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.text(), r#"{"detail":"not found"}"#);
        assert_eq!(store.token().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_server_errors_are_returned_not_raised() {
        let store = Arc::new(MemorySessionStore::with_token("abc", None));
        let transport = RecordingTransport::new();
        transport.respond(403, "forbidden");
        transport.respond(500, "boom");
        let client = client_with(store.clone(), transport);

        assert_eq!(client.get("/a").await.unwrap().status().as_u16(), 403);
        assert_eq!(client.get("/b").await.unwrap().status().as_u16(), 500);
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn test_network_errors_propagate_unchanged() {
        let store = Arc::new(MemorySessionStore::with_token("abc", None));
        let transport = RecordingTransport::new();
        transport.fail("connection refused");
        let client = client_with(store.clone(), transport.clone());

        let err = client.get("/profile").await.unwrap_err();
        match err {
            ApiError::Network(source) => assert_eq!(source.to_string(), "connection refused"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.is_authenticated());
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_token_header_fails_before_io() {
        let transport = RecordingTransport::new();
        let client = client_with(
            Arc::new(MemorySessionStore::with_token("abc\ndef", None)),
            transport.clone(),
        );

        let err = client.get("/profile").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_session() {
        let store = Arc::new(MemorySessionStore::with_token("abc", None));
        let transport = RecordingTransport::new();
        let client = client_with(store, transport.clone());

        let (a, b, c) = tokio::join!(client.get("/a"), client.get("/b"), client.get("/c"));
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(transport.call_count(), 3);
        for sent in transport.requests() {
            assert_eq!(sent.headers[header::AUTHORIZATION], "Bearer abc");
        }
    }
}
