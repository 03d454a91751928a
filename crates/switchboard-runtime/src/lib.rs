//! Switchboard Runtime - Orchestration layer for the Switchboard bot dispatch engine.
//!
//! This crate provides:
//! - The platform-backed bot (`TelegramBot`)
//! - Bot instance orchestration (`Switchboard`, `SwitchboardBuilder`)
//! - Layered configuration (defaults, files, `SWITCHBOARD_` environment)
//! - Logging configuration
//!
//! # From configuration
//!
//! ```ignore
//! use switchboard_runtime::Switchboard;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Reads switchboard.toml and SWITCHBOARD_* variables, initializes logging
//!     let bot = Switchboard::load()?;
//!     bot.init().await?;
//!
//!     bot.run(updates).await;
//!     Ok(())
//! }
//! ```
//!
//! # Manual setup
//!
//! ```ignore
//! use switchboard_runtime::{LoggingBuilder, SpanEvents, Switchboard};
//!
//! LoggingBuilder::new()
//!     .directive("switchboard_framework=debug")
//!     .span_events(SpanEvents::LIFECYCLE)
//!     .init();
//!
//! let bot = Switchboard::builder("123456:ABC")
//!     .test_environment(true)
//!     .skip_get_me(true)
//!     .build()?;
//! ```
//!
//! # Independence
//!
//! Every [`Switchboard`] owns its transport, registry and cancellation token.
//! Shutting one down leaves the others untouched.

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use bot::TelegramBot;
pub use config::{
    BotConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, Profile, SwitchboardConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{Switchboard, SwitchboardBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
