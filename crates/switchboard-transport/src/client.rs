//! The injectable HTTP client capability.

use async_trait::async_trait;

/// Error returned by an [`HttpClient`].
///
/// Implementations should avoid embedding the request URL; the transport
/// scrubs the token from the text regardless.
pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// A single outbound HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method, e.g. `"POST"`.
    pub method: String,
    /// Absolute request URL, token included.
    pub url: String,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Creates a `POST` request with a JSON body.
    pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: "POST".to_string(),
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        }
    }
}

/// A completed HTTP exchange.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response from a status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Performs one HTTP request and returns the response or an error.
///
/// This is the only network capability the transport needs, which lets tests
/// substitute a recording mock.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Executes the request. Dropping the returned future aborts it.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}
