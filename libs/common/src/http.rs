//! HTTP client for the Clover Books REST API
//!
//! Wraps a `reqwest::Client` with a shared cookie jar so session and CSRF
//! cookies set by the server are replayed on later requests. Every
//! state-changing request carries the `X-CSRFToken` header; a request for
//! which no token can be found is never sent.

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::config::ApiConfig;
use crate::csrf::{CSRF_HEADER, token_from_cookie_header};
use crate::error::{ClientError, ClientResult};

/// A decoded response of any status
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// JSON body; `Value::Null` for empty bodies and non-JSON error bodies
    pub body: Value,
}

impl ApiResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The server's `{error}` message, if the body carries one
    pub fn error_message(&self) -> Option<String> {
        self.body
            .get("error")
            .and_then(|e| e.as_str())
            .map(|e| e.to_string())
    }

    /// Convert a non-2xx response into a `ClientError::Status`
    pub fn into_error(self) -> ClientError {
        ClientError::Status {
            status: self.status.as_u16(),
            message: self.error_message(),
        }
    }

    /// Fail with `ClientError::Status` unless the status is 2xx
    pub fn error_for_status(self) -> ClientResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Deserialize a top-level field of the body, e.g. `role` in `{ "role": {...} }`
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> ClientResult<T> {
        let value = self.body.get(key).cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }
}

/// Client for the Clover Books REST API
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
    jar: Arc<Jar>,
    form_token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    /// Build a client from configuration
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            ClientError::Configuration(format!("Invalid base URL {}: {}", config.base_url, e))
        })?;

        let jar = Arc::new(Jar::default());
        let mut builder = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .user_agent(config.user_agent.clone());

        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder.build()?;

        Ok(Self {
            base,
            client,
            jar,
            form_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Server origin this client talks to
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve an API path against the base URL
    pub fn url(&self, path: &str) -> ClientResult<Url> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Configuration(format!("Invalid API path {}: {}", path, e)))
    }

    /// Register a token read from a hidden form field.
    ///
    /// Used only when no `csrftoken` cookie is present.
    pub async fn set_form_token(&self, token: impl Into<String>) {
        let token = token.into();
        *self.form_token.write().await = (!token.is_empty()).then_some(token);
    }

    /// The token that will be attached to the next state-changing request
    pub async fn csrf_token(&self) -> Option<String> {
        let from_cookie = self
            .jar
            .cookies(&self.base)
            .and_then(|header| header.to_str().ok().and_then(token_from_cookie_header));

        match from_cookie {
            Some(token) => Some(token),
            None => self.form_token.read().await.clone(),
        }
    }

    pub async fn get(&self, path: &str) -> ClientResult<ApiResponse> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<ApiResponse> {
        self.send(Method::POST, path, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<ApiResponse> {
        self.send(Method::PATCH, path, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<ApiResponse> {
        self.send(Method::DELETE, path, None).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<ApiResponse> {
        let url = self.url(path)?;
        let mut request = self
            .client
            .request(method.clone(), url)
            .header(reqwest::header::ACCEPT, "application/json");

        if method != Method::GET && method != Method::HEAD {
            let token = self.csrf_token().await.ok_or_else(|| {
                error!("No CSRF token available for {} {}", method, path);
                ClientError::MissingCsrfToken
            })?;
            request = request.header(CSRF_HEADER, token);
        }

        if let Some(body) = body {
            request = request.json(&body);
        }

        debug!("Sending {} {}", method, path);
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("{} {} answered {}", method, path, status);

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) if status.is_success() => return Err(ClientError::Decode(e)),
                Err(_) => Value::Null,
            }
        };

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: Value) -> ApiResponse {
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body,
        }
    }

    #[test]
    fn test_error_message_reads_error_field() {
        let resp = response(400, json!({"error": "Label is required"}));
        assert_eq!(resp.error_message(), Some("Label is required".to_string()));

        let resp = response(500, Value::Null);
        assert_eq!(resp.error_message(), None);
    }

    #[test]
    fn test_error_for_status() {
        assert!(response(204, Value::Null).error_for_status().is_ok());

        let err = response(404, json!({"error": "Role not found"}))
            .error_for_status()
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.user_message(), "Role not found");
    }

    #[test]
    fn test_field_decodes_nested_value() {
        let resp = response(200, json!({"roles": [1, 2, 3]}));
        let roles: Vec<i64> = resp.field("roles").unwrap();
        assert_eq!(roles, vec![1, 2, 3]);

        let missing: Option<Vec<i64>> = resp.field("warnings").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_url_resolution() {
        let client = ApiClient::new(&ApiConfig::new("http://localhost:8000")).unwrap();
        assert_eq!(
            client.url("/api/settings/roles/7/").unwrap().as_str(),
            "http://localhost:8000/api/settings/roles/7/"
        );
    }

    #[test]
    fn test_invalid_base_url_is_configuration_error() {
        let result = ApiClient::new(&ApiConfig::new("not a url"));
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_form_token_used_without_cookie() {
        let client = ApiClient::new(&ApiConfig::new("http://localhost:8000")).unwrap();
        assert_eq!(client.csrf_token().await, None);

        client.set_form_token("from-form").await;
        assert_eq!(client.csrf_token().await, Some("from-form".to_string()));

        client.set_form_token("").await;
        assert_eq!(client.csrf_token().await, None);
    }

    #[tokio::test]
    async fn test_state_changing_request_without_token_is_not_sent() {
        // Nothing listens on this port; the request must fail before dialing
        let client = ApiClient::new(&ApiConfig::new("http://127.0.0.1:9")).unwrap();
        let result = client.post("/api/settings/roles/", &json!({"label": "x"})).await;
        assert!(matches!(result, Err(ClientError::MissingCsrfToken)));
    }
}
