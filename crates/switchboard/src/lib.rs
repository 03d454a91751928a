//! # Switchboard
//!
//! An update-dispatch engine for Telegram-style bots.
//!
//! ## Overview
//!
//! Applications register handlers against a bot instance. Each handler pairs
//! a match rule with an async callback. Every incoming update is tested
//! against all registered rules and every matching callback runs.
//!
//! ```text
//! ┌──────────┐     ┌────────────┐     ┌────────────────────────────┐
//! │  Update  │────▶│ Dispatcher │────▶│ handler "start" (matched)  │──▶ Bot API
//! │  source  │     │  registry  │────▶│ handler "echo"  (matched)  │──▶ Bot API
//! └──────────┘     └────────────┘     │ default handler (if none)  │
//!                                     └────────────────────────────┘
//! ```
//!
//! - **Match rules**: exact, prefix, contains, regexp and three command
//!   variants over a selected update field, or a free-form predicate
//! - **Registry**: thread-safe, mutable while updates are being processed
//! - **Transport**: `/bot{token}/{method}` requests, with the token kept out
//!   of errors and logs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use switchboard::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bot = Switchboard::builder("123456:ABC").build()?;
//!
//!     bot.register_handler(
//!         HandlerType::MessageText,
//!         "start",
//!         MatchType::CommandStartMaybeWithBotUsernameSuffix,
//!         handler_fn(|bot, update| async move {
//!             // ...
//!         }),
//!     );
//!
//!     bot.init().await?;
//!     bot.run(updates).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output
//! - `reqwest-client` (default): the `reqwest`-backed HTTP client

pub use switchboard_core as core;
pub use switchboard_framework as framework;
pub use switchboard_runtime as runtime;
pub use switchboard_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use switchboard::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use switchboard_runtime::{
        RuntimeError, RuntimeResult, Switchboard, SwitchboardBuilder, TelegramBot,
    };

    // Handler registration
    pub use switchboard_framework::{
        HandlerFunc, HandlerId, HandlerType, MatchRule, MatchType, Middleware, Regex, handler_fn,
    };

    // Update model and bot capability
    pub use switchboard_core::{
        ApiError, ApiResult, Bot, BoxedBot, CallbackQuery, Message, MessageEntity, Update, User,
    };
}
