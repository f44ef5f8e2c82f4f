//! Authenticated HTTP client core for the admin API.
//!
//! # Design
//! `ApiClient` holds the base url, a credential provider and a transport.
//! The sans-IO half (`build_request`, `parse_response`) is deterministic and
//! usable on its own by hosts that execute requests themselves. The async
//! verb methods chain build, `Transport::execute` and parse.
//!
//! Authorization is applied in one place, `authorize`, after per-call
//! options are merged, so no caller can send a request without the bearer
//! header or override it.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::credentials::CredentialProvider;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestOptions};
use crate::transport::Transport;

/// Token text sent when the provider has no token.
pub const MISSING_TOKEN: &str = "undefined";

/// Cloneable handle issuing authenticated JSON requests under one base url.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        credentials: impl CredentialProvider + 'static,
        transport: impl Transport + 'static,
    ) -> Self {
        Self {
            base_url: config.base_url(),
            credentials: Arc::new(credentials),
            transport: Arc::new(transport),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the request for `base_url + path` without touching the network.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        options: &RequestOptions,
    ) -> HttpRequest {
        let mut url = format!("{}{path}", self.base_url);
        if !options.query.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(options.query.iter())
                .finish();
            let fragment = url.find('#').map(|at| url.split_off(at));
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
            if let Some(fragment) = fragment {
                url.push_str(&fragment);
            }
        }

        let mut headers = Vec::new();
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        let mut request = HttpRequest {
            method,
            url,
            headers,
            body,
        };
        for (name, value) in &options.headers {
            request.set_header(name, value.clone());
        }

        self.authorize(&mut request);
        request
    }

    /// Stamp `Authorization: Bearer <token>` with the provider's current
    /// token, replacing whatever the request carried.
    pub fn authorize(&self, request: &mut HttpRequest) {
        let token = self
            .credentials
            .token()
            .unwrap_or_else(|| MISSING_TOKEN.to_string());
        request.set_header("Authorization", format!("Bearer {token}"));
    }

    /// Decode a 2xx body as `T`, or surface the server's body as the error.
    pub fn parse_response<T: DeserializeOwned>(
        &self,
        response: HttpResponse,
    ) -> Result<T, ApiError> {
        if !response.is_success() {
            return Err(ApiError::Server {
                status: response.status,
                body: decode_error_body(&response.body),
            });
        }
        let body = if response.body.trim().is_empty() {
            "null"
        } else {
            response.body.as_str()
        };
        serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Build, execute and parse one request.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        let request = self.build_request(method, path, body, options);
        tracing::debug!(method = %request.method, url = %request.url, "dispatching request");

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%method, path, error = %e, "request failed without a response");
                return Err(e.into());
            }
        };
        if !response.is_success() {
            tracing::warn!(%method, path, status = response.status, "server rejected request");
        }
        self.parse_response(response)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.request(HttpMethod::Get, path, None, options).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        let body = encode_body(body)?;
        self.request(HttpMethod::Post, path, Some(body), options).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        let body = encode_body(body)?;
        self.request(HttpMethod::Put, path, Some(body), options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.request(HttpMethod::Delete, path, None, options).await
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// JSON when it parses, the raw text as a JSON string otherwise.
fn decode_error_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::credentials::CredentialStore;
    use crate::error::TransportError;

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::new("connection refused"))
        }
    }

    fn client_with(store: CredentialStore) -> ApiClient {
        ApiClient::new(&ClientConfig::new(""), store, Unreachable)
    }

    fn client() -> ApiClient {
        client_with(CredentialStore::with_token("t0ken"))
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_get_produces_correct_request() {
        let req = client().build_request(HttpMethod::Get, "/customers/42", None, &RequestOptions::new());
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "/api/customers/42");
        assert!(req.body.is_none());
        assert_eq!(
            req.headers,
            vec![("Authorization".to_string(), "Bearer t0ken".to_string())]
        );
    }

    #[test]
    fn build_with_body_sets_content_type() {
        let req = client().build_request(
            HttpMethod::Put,
            "/customers/42",
            Some(r#"{"name":""}"#.to_string()),
            &RequestOptions::new(),
        );
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.body.as_deref(), Some(r#"{"name":""}"#));
    }

    #[test]
    fn origin_is_prepended() {
        let client = ApiClient::new(
            &ClientConfig::new("http://localhost:3000/"),
            CredentialStore::new(),
            Unreachable,
        );
        let req = client.build_request(HttpMethod::Get, "/customers", None, &RequestOptions::new());
        assert_eq!(req.url, "http://localhost:3000/api/customers");
    }

    #[test]
    fn token_is_read_fresh_for_every_request() {
        let store = CredentialStore::with_token("first");
        let client = client_with(store.clone());

        let req = client.build_request(HttpMethod::Get, "/x", None, &RequestOptions::new());
        assert_eq!(req.header("authorization"), Some("Bearer first"));

        store.set_token("second");
        let req = client.build_request(HttpMethod::Get, "/x", None, &RequestOptions::new());
        assert_eq!(req.header("authorization"), Some("Bearer second"));
    }

    #[test]
    fn provider_is_consulted_once_per_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let provider = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Some("t".to_string())
        };
        let client = ApiClient::new(&ClientConfig::new(""), provider, Unreachable);
        client.build_request(HttpMethod::Get, "/a", None, &RequestOptions::new());
        client.build_request(HttpMethod::Get, "/b", None, &RequestOptions::new());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_token_sends_bearer_undefined() {
        let req = client_with(CredentialStore::new()).build_request(
            HttpMethod::Get,
            "/customers/42",
            None,
            &RequestOptions::new(),
        );
        assert_eq!(req.header("Authorization"), Some("Bearer undefined"));
    }

    #[test]
    fn options_cannot_override_authorization() {
        let options = RequestOptions::new()
            .header("authorization", "Basic abc")
            .header("X-Request-Id", "r1");
        let req = client().build_request(HttpMethod::Get, "/x", None, &options);
        assert_eq!(req.header("Authorization"), Some("Bearer t0ken"));
        assert_eq!(req.header("x-request-id"), Some("r1"));
        assert_eq!(
            req.headers.iter().filter(|(k, _)| k.eq_ignore_ascii_case("authorization")).count(),
            1
        );
    }

    #[test]
    fn query_options_are_encoded() {
        let options = RequestOptions::new().query("search", "Ada Lovelace").query("page", "2");
        let req = client().build_request(HttpMethod::Get, "/customers", None, &options);
        assert_eq!(req.url, "/api/customers?search=Ada+Lovelace&page=2");

        let req = client().build_request(HttpMethod::Get, "/customers?sort=name", None, &options);
        assert_eq!(req.url, "/api/customers?sort=name&search=Ada+Lovelace&page=2");
    }

    #[test]
    fn query_goes_before_fragment() {
        let options = RequestOptions::new().query("p", "2");
        let req = client().build_request(HttpMethod::Get, "/c#frag", None, &options);
        assert_eq!(req.url, "/api/c?p=2#frag");

        let req = client().build_request(HttpMethod::Get, "/c?sort=name#frag", None, &options);
        assert_eq!(req.url, "/api/c?sort=name&p=2#frag");
    }

    #[test]
    fn parse_success_returns_body_unchanged() {
        let value: Value = client()
            .parse_response(response(200, r#"{"id":"42","name":"Ada"}"#))
            .unwrap();
        assert_eq!(value, json!({"id": "42", "name": "Ada"}));
    }

    #[test]
    fn parse_empty_success_body_as_null() {
        client().parse_response::<()>(response(204, "")).unwrap();
        let value: Option<Value> = client().parse_response(response(200, "")).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn parse_rejection_returns_server_body() {
        let err = client()
            .parse_response::<Value>(response(422, r#"{"errors":{"name":["required"]}}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 422, .. }));
        assert_eq!(err.body(), Some(&json!({"errors": {"name": ["required"]}})));
    }

    #[test]
    fn parse_rejection_with_text_body() {
        let err = client()
            .parse_response::<Value>(response(500, "internal error"))
            .unwrap_err();
        assert_eq!(err.body(), Some(&json!("internal error")));
    }

    #[test]
    fn parse_rejection_with_empty_body() {
        let err = client().parse_response::<Value>(response(404, "")).unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.body(), Some(&Value::Null));
    }

    #[test]
    fn parse_bad_json() {
        let err = client()
            .parse_response::<Vec<Value>>(response(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let err = client().get::<Value>("/customers", &RequestOptions::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert!(err.body().is_none());
    }
}
