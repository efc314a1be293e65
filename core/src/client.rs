//! HTTP client adapter for the HR backend.
//!
//! # Design
//! `ApiClient` keeps the build/parse split: `build_request` produces an
//! `HttpRequest` and `parse_response` consumes an `HttpResponse`, both free of
//! I/O. `send` glues them together through the injected `Transport`. The
//! bearer token is fetched from the `CredentialProvider` while building each
//! request and is never stored on the client.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::credentials::CredentialProvider;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Query parameters appended to a request path.
pub type Query = Vec<(String, String)>;

/// Client for the HR REST API.
///
/// Clones share the transport and the credential provider.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            credentials,
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self::new(&config.base_url, transport, credentials)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request for `path` (relative to the base URL).
    ///
    /// The `Authorization` header is present only when the provider has a
    /// token at this moment.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(String, String)],
        body: Option<String>,
    ) -> HttpRequest {
        let mut url = format!("{}{}", self.base_url, path);
        if !query.is_empty() {
            let encoded: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&encoded.join("&"));
        }

        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = self.credentials.token() {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }

        HttpRequest {
            method,
            path: url,
            headers,
            body,
        }
    }

    /// Decode a 2xx response body as `T`.
    pub fn parse_response<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    /// Accept any 2xx response and ignore its body.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    /// Execute a request and decode the JSON response.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(String, String)],
        body: Option<String>,
    ) -> Result<T, ApiError> {
        let response = self.execute(method, path, query, body).await?;
        self.parse_response(response)
    }

    /// Execute a request whose response carries no body of interest.
    pub async fn send_empty(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(String, String)],
        body: Option<String>,
    ) -> Result<(), ApiError> {
        let response = self.execute(method, path, query, body).await?;
        self.parse_empty(response)
    }

    async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(String, String)],
        body: Option<String>,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(method, path, query, body);
        self.dispatch(request).await
    }

    /// Execute a request built by `build_request`.
    ///
    /// Returns whatever response arrived, whatever its status; only a missing
    /// response is an error here. A 401 to an authenticated request
    /// invalidates the credential provider.
    pub async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method;
        let url = request.path.clone();
        let authenticated = request.header("authorization").is_some();
        debug!(method = method.as_str(), %url, authenticated, "sending request");

        let response = self.transport.execute(request).await.map_err(|e| {
            warn!(method = method.as_str(), %url, cause = %e.cause, "no response from server");
            ApiError::from(e)
        })?;

        debug!(method = method.as_str(), %url, status = response.status, "received response");
        if response.status == 401 && authenticated {
            warn!(%url, "token rejected by server, invalidating credentials");
            self.credentials.invalidate();
        }
        Ok(response)
    }
}

/// Serialize a request payload to a JSON body.
pub fn encode<T: Serialize>(payload: &T) -> Result<String, ApiError> {
    serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-2xx status codes to `ApiError::HttpError`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
