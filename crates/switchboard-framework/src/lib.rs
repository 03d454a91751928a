//! # Switchboard Framework
//!
//! The dispatch half of Switchboard: a concurrent handler registry, the
//! match-rule family that decides which handlers an update reaches, and the
//! dispatcher that invokes them.
//!
//! ## Overview
//!
//! - [`HandlerRegistry`]: ordered, lock-protected collection of [`Handler`]s
//! - [`MatchRule`]: exact / prefix / contains / regexp / command / custom predicates
//! - [`Dispatcher`]: evaluates rules against one snapshot and runs every match
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use switchboard_framework::*;
//!
//! let registry = Arc::new(HandlerRegistry::new());
//! registry.register(
//!     HandlerType::MessageText,
//!     "start",
//!     MatchType::CommandStartOnly,
//!     handler_fn(|bot, update| async move {
//!         tracing::info!(update_id = update.update_id, bot = bot.id(), "start");
//!     }),
//! );
//!
//! let dispatcher = Dispatcher::new(registry);
//! let outcome = dispatcher.dispatch(update, bot).await;
//! ```

pub mod command;
pub mod dispatcher;
pub mod handler;
pub mod matcher;
pub mod registry;

pub use dispatcher::{DispatchOutcome, Dispatcher, ExecutionMode, Middleware};
pub use handler::{BoxFuture, Handler, HandlerFunc, HandlerId, handler_fn};
pub use matcher::{HandlerType, MatchFunc, MatchRule, MatchType};
pub use registry::HandlerRegistry;

pub use regex::Regex;
