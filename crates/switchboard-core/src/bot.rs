//! Bot abstraction handed to handler callbacks.
//!
//! Handlers receive a [`BoxedBot`] so they can issue further platform calls
//! without knowing which transport sits behind it.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiResult;

/// The bot's own platform identity, read during command matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotIdentity {
    /// The bot's username without the leading `@`, once known.
    pub username: Option<String>,
}

impl BotIdentity {
    /// Creates an identity with a known username.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
        }
    }

    /// Returns the username, treating an empty string as unset.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.is_empty())
    }
}

/// A bot instance that handlers can call back into.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Returns a stable identifier for this bot instance.
    fn id(&self) -> &str;

    /// Returns a snapshot of the bot's identity.
    fn identity(&self) -> BotIdentity;

    /// Calls a platform API method and returns its `result` payload.
    async fn call_api(&self, method: &str, params: Value) -> ApiResult<Value>;

    /// Upcasts to `Any` so handlers can reach the concrete bot type.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A type-erased, shareable bot.
pub type BoxedBot = Arc<dyn Bot>;
