//! `reqwest`-backed [`HttpClient`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method};

use crate::client::{ClientError, HttpClient, HttpRequest, HttpResponse};
use switchboard_core::{TransportError, TransportResult};

/// HTTP client implementation over `reqwest`.
///
/// Errors are stripped of their URL before they leave this type.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Creates a client with the given request timeout.
    pub fn new(timeout: Duration) -> TransportResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.without_url().to_string()))?;

        Ok(Self { client })
    }

    /// Wraps a pre-configured `reqwest` client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let method = Method::from_bytes(request.method.as_bytes())?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let resp = builder
            .body(request.body)
            .send()
            .await
            .map_err(|e| e.without_url())?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| e.without_url())?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
