//! Request construction and the token-safe request path.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::client::{HttpClient, HttpRequest, HttpResponse};
use crate::response::decode_response;
use switchboard_core::{ApiResult, TransportError, TransportResult};

/// Production API endpoint.
pub const DEFAULT_SERVER_URL: &str = "https://api.telegram.org";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Placeholder that stands in for the token in errors and logs.
pub const REDACTED: &str = "<redacted>";

/// Builds the request path for an API method.
///
/// The format is part of the platform contract and must stay bit-exact.
pub fn request_path(token: &str, method: &str, test_environment: bool) -> String {
    if test_environment {
        format!("/bot{token}/test/{method}")
    } else {
        format!("/bot{token}/{method}")
    }
}

/// Transport configuration for one bot instance.
pub struct TransportConfig {
    /// Base URL of the API server, without the `/bot...` path.
    pub server_url: String,
    /// Bot token.
    pub token: SecretString,
    /// Whether to address the test environment.
    pub test_environment: bool,
    /// Request timeout, applied by the HTTP client.
    pub timeout: Duration,
}

impl TransportConfig {
    /// Creates a production config for the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            token: SecretString::from(token.into()),
            test_environment: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the API server base URL.
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Switches requests to the test environment.
    pub fn with_test_environment(mut self, enabled: bool) -> Self {
        self.test_environment = enabled;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("server_url", &self.server_url)
            .field("token", &REDACTED)
            .field("test_environment", &self.test_environment)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Issues API calls for one bot.
///
/// Each call is a single attempt: there is no retry, no backoff and no queue.
pub struct Transport {
    config: TransportConfig,
    client: Arc<dyn HttpClient>,
}

impl Transport {
    /// Creates a transport over the given HTTP client.
    pub fn new(config: TransportConfig, client: Arc<dyn HttpClient>) -> Self {
        Self { config, client }
    }

    /// Creates a transport over a [`ReqwestClient`](crate::ReqwestClient)
    /// using the configured timeout.
    #[cfg(feature = "reqwest-client")]
    pub fn with_default_client(config: TransportConfig) -> TransportResult<Self> {
        let client = crate::ReqwestClient::new(config.timeout)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn base_url(&self) -> &str {
        self.config.server_url.trim_end_matches('/')
    }

    /// Returns the full request URL for a method, token included.
    pub fn request_url(&self, method: &str) -> String {
        let path = request_path(
            self.config.token.expose_secret(),
            method,
            self.config.test_environment,
        );
        format!("{}{}", self.base_url(), path)
    }

    /// Returns the request URL for a method with the token replaced by
    /// [`REDACTED`].
    pub fn redacted_url(&self, method: &str) -> String {
        let path = request_path(REDACTED, method, self.config.test_environment);
        format!("{}{}", self.base_url(), path)
    }

    /// Removes every occurrence of the token from `text`.
    fn scrub(&self, text: &str) -> String {
        let token = self.config.token.expose_secret();
        if token.is_empty() {
            text.to_string()
        } else {
            text.replace(token, REDACTED)
        }
    }

    /// Sends one request for `method` and returns the raw response.
    ///
    /// `params` is sent as a JSON body (`{}` when absent). Cancelling
    /// `cancel` drops the in-flight request and yields
    /// [`TransportError::Cancelled`].
    pub async fn raw_request(
        &self,
        cancel: &CancellationToken,
        method: &str,
        params: Option<&Value>,
    ) -> TransportResult<HttpResponse> {
        let body = match params {
            Some(p) => serde_json::to_vec(p).map_err(|e| TransportError::Encode(e.to_string()))?,
            None => b"{}".to_vec(),
        };
        let request = HttpRequest::post_json(self.request_url(method), body);

        debug!(method = %method, url = %self.redacted_url(method), "Sending API request");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(method = %method, "API request cancelled");
                return Err(TransportError::Cancelled {
                    method: method.to_string(),
                });
            }
            result = self.client.execute(request) => result,
        };

        match result {
            Ok(response) => {
                trace!(method = %method, status = response.status, "API response received");
                Ok(response)
            }
            Err(e) => {
                let reason = self.scrub(&e.to_string());
                warn!(method = %method, reason = %reason, "API request failed");
                Err(TransportError::Request {
                    method: method.to_string(),
                    url: self.redacted_url(method),
                    reason,
                })
            }
        }
    }

    /// Sends one request and decodes the platform's response envelope.
    pub async fn call(
        &self,
        cancel: &CancellationToken,
        method: &str,
        params: Option<&Value>,
    ) -> ApiResult<Value> {
        let response = self.raw_request(cancel, method, params).await?;
        decode_response(method, &response)
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use async_trait::async_trait;
    use serde_json::json;
    use parking_lot::Mutex;
    use switchboard_core::ApiError;

    /// Records requests and fails any request whose URL starts with `failed`,
    /// echoing the full URL (token included) back as the error text.
    #[derive(Default)]
    struct MockClient {
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockClient {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn last_request(&self) -> HttpRequest {
            self.requests.lock().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl HttpClient for MockClient {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
            self.requests.lock().push(request.clone());
            if request.url.starts_with("failed") {
                return Err(request.url.into());
            }
            Ok(HttpResponse::new(200, r#"{"ok":true,"result":true}"#))
        }
    }

    /// Never completes, so only cancellation can end the request.
    struct HangingClient;

    #[async_trait]
    impl HttpClient for HangingClient {
        async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ClientError> {
            std::future::pending().await
        }
    }

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("XXX", "foo", false), "/botXXX/foo");
        assert_eq!(request_path("XXX", "foo", true), "/botXXX/test/foo");
    }

    #[tokio::test]
    async fn test_raw_request_url() {
        let client = MockClient::new();
        let transport = Transport::new(
            TransportConfig::new("XXX").with_server_url("http://localhost:8081"),
            client.clone(),
        );

        transport
            .raw_request(&CancellationToken::new(), "foo", None)
            .await
            .unwrap();

        let request = client.last_request();
        assert_eq!(request.url, "http://localhost:8081/botXXX/foo");
        assert_eq!(request.method, "POST");
        assert_eq!(request.body, b"{}");
    }

    #[tokio::test]
    async fn test_raw_request_url_test_env() {
        let client = MockClient::new();
        let transport = Transport::new(
            TransportConfig::new("XXX")
                .with_server_url("http://localhost:8081/")
                .with_test_environment(true),
            client.clone(),
        );

        transport
            .raw_request(&CancellationToken::new(), "foo", None)
            .await
            .unwrap();

        assert_eq!(
            client.last_request().url,
            "http://localhost:8081/botXXX/test/foo"
        );
    }

    #[tokio::test]
    async fn test_raw_request_sends_params_as_json() {
        let client = MockClient::new();
        let transport = Transport::new(TransportConfig::new("XXX"), client.clone());

        let params = json!({"chat_id": 1, "text": "hi"});
        transport
            .raw_request(&CancellationToken::new(), "sendMessage", Some(&params))
            .await
            .unwrap();

        let sent: Value = serde_json::from_slice(&client.last_request().body).unwrap();
        assert_eq!(sent, params);
    }

    #[tokio::test]
    async fn test_raw_request_err_hides_token() {
        let client = MockClient::new();
        let transport = Transport::new(
            TransportConfig::new("XXX").with_server_url("failed"),
            client.clone(),
        );

        let err = transport
            .raw_request(&CancellationToken::new(), "foo", None)
            .await
            .unwrap_err();

        // The wire URL did carry the token.
        assert_eq!(client.last_request().url, "failed/botXXX/foo");
        assert!(matches!(err, TransportError::Request { .. }));
        assert!(!err.to_string().contains("XXX"), "token leaked: {err}");
        assert!(!format!("{err:?}").contains("XXX"), "token leaked: {err:?}");
    }

    #[tokio::test]
    async fn test_raw_request_cancelled() {
        let transport = Transport::new(TransportConfig::new("XXX"), Arc::new(HangingClient));
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let err = transport.raw_request(&cancel, "getMe", None).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_call_decodes_result() {
        let transport = Transport::new(TransportConfig::new("XXX"), MockClient::new());
        let value = transport
            .call(&CancellationToken::new(), "foo", None)
            .await
            .unwrap();
        assert_eq!(value, json!(true));
    }

    #[tokio::test]
    async fn test_call_propagates_transport_error() {
        let transport = Transport::new(
            TransportConfig::new("XXX").with_server_url("failed"),
            MockClient::new(),
        );
        let err = transport
            .call(&CancellationToken::new(), "foo", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(!err.to_string().contains("XXX"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let transport = Transport::new(TransportConfig::new("XXX"), MockClient::new());
        let debug = format!("{transport:?}");
        assert!(!debug.contains("XXX"));
        assert!(debug.contains(REDACTED));
        assert_eq!(
            transport.redacted_url("getMe"),
            "https://api.telegram.org/bot<redacted>/getMe"
        );
    }
}
