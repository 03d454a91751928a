//! # Switchboard Core
//!
//! The shared vocabulary of the Switchboard bot dispatch engine.
//!
//! This crate holds the pieces every other layer agrees on:
//!
//! - **Update model**: the inbound platform objects ([`Update`], [`Message`],
//!   [`CallbackQuery`], [`MessageEntity`]) as plain serde types
//! - **Bot capability**: the [`Bot`] trait handed to handler callbacks so they
//!   can call back into the platform, plus the read-only [`BotIdentity`]
//! - **Error taxonomy**: [`TransportError`] for network-level failures and
//!   [`ApiError`] for failed platform calls
//!
//! ## Layering
//!
//! ```text
//! ┌──────────────────────┐
//! │  switchboard-runtime │  config, logging, TelegramBot, Switchboard
//! ├──────────────────────┤
//! │ switchboard-framework│  match rules, registry, dispatcher
//! ├──────────────────────┤
//! │ switchboard-transport│  request URLs, HTTP client, error hygiene
//! ├──────────────────────┤
//! │  switchboard-core    │  <- This crate
//! └──────────────────────┘
//! ```

pub mod bot;
pub mod error;
pub mod model;

pub use bot::{Bot, BotIdentity, BoxedBot};
pub use error::{ApiError, ApiResult, TransportError, TransportResult};
pub use model::{
    CallbackQuery, Chat, Message, MessageEntity, MessageEntityType, Update, UpdateKind, User,
};
