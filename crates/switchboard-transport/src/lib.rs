//! # Switchboard Transport
//!
//! Issues authenticated HTTP calls to the platform and reports the outcome
//! without leaking the bot token.
//!
//! ## Features
//!
//! - `reqwest-client` (default): [`ReqwestClient`], an [`HttpClient`] backed by `reqwest`
//!
//! ## Request paths
//!
//! | Mode | Path |
//! |------|------|
//! | production | `/bot{token}/{method}` |
//! | test environment | `/bot{token}/test/{method}` |
//!
//! The token only ever appears in the URL sent over the wire. Errors and log
//! lines use [`Transport::redacted_url`] instead.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use switchboard_transport::{Transport, TransportConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let transport = Transport::with_default_client(TransportConfig::new("123:ABC"))?;
//! let me = transport.call(&CancellationToken::new(), "getMe", None).await?;
//! ```

mod client;
mod response;
mod transport;

#[cfg(feature = "reqwest-client")]
mod reqwest_client;

pub use client::{ClientError, HttpClient, HttpRequest, HttpResponse};
pub use response::{ResponseParameters, decode_response};
pub use transport::{
    DEFAULT_SERVER_URL, DEFAULT_TIMEOUT, REDACTED, Transport, TransportConfig, request_path,
};

#[cfg(feature = "reqwest-client")]
pub use reqwest_client::ReqwestClient;

pub use tokio_util::sync::CancellationToken;
