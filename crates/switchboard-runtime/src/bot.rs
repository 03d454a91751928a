//! Platform-backed [`Bot`] implementation.
//!
//! [`TelegramBot`] issues every call through one [`Transport`] and one
//! cancellation token, so [`TelegramBot::shutdown`] aborts all in-flight
//! calls at once. Handlers that need the typed helpers can downcast:
//!
//! ```rust,ignore
//! async fn reply(bot: BoxedBot, update: Arc<Update>) {
//!     if let Ok(bot) = bot.as_any().downcast::<TelegramBot>() {
//!         let _ = bot.send_message(chat_id, "pong").await;
//!     }
//! }
//! ```

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use switchboard_core::{ApiResult, Bot, BotIdentity, Message, User};
use switchboard_transport::Transport;

/// A bot instance talking to the platform over HTTP.
pub struct TelegramBot {
    /// Numeric bot id taken from the token prefix; never the token itself.
    id: String,
    transport: Transport,
    identity: RwLock<BotIdentity>,
    cancel: CancellationToken,
}

impl TelegramBot {
    /// Creates a bot over the given transport.
    pub fn new(transport: Transport) -> Self {
        let id = bot_id_from_token(transport.config().token.expose_secret());
        Self {
            id,
            transport,
            identity: RwLock::new(BotIdentity::default()),
            cancel: CancellationToken::new(),
        }
    }

    /// Sets a known identity up front.
    pub fn with_identity(self, identity: BotIdentity) -> Self {
        *self.identity.write() = identity;
        self
    }

    /// Replaces the bot's username.
    pub fn set_username(&self, username: Option<String>) {
        self.identity.write().username = username;
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Returns the token cancelled by [`shutdown`](Self::shutdown).
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancels every in-flight and future call made through this bot.
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            info!(bot = %self.id, "Shutting down bot");
            self.cancel.cancel();
        }
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // =========================================================================
    // Typed API helpers
    // =========================================================================

    /// Calls `getMe` and records the returned username.
    pub async fn get_me(&self) -> ApiResult<User> {
        let result = self.call("getMe", None).await?;
        let me: User = serde_json::from_value(result)?;

        debug!(bot = %self.id, username = ?me.username, "Received bot identity");
        self.set_username(me.username.clone());
        Ok(me)
    }

    /// Sends a text message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> ApiResult<Message> {
        let params = json!({ "chat_id": chat_id, "text": text });
        let result = self.call("sendMessage", Some(&params)).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Answers a callback query, optionally showing `text` to the user.
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> ApiResult<bool> {
        let mut params = json!({ "callback_query_id": callback_query_id });
        if let Some(text) = text {
            params["text"] = Value::from(text);
        }
        let result = self.call("answerCallbackQuery", Some(&params)).await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn call(&self, method: &str, params: Option<&Value>) -> ApiResult<Value> {
        self.transport.call(&self.cancel, method, params).await
    }
}

#[async_trait]
impl Bot for TelegramBot {
    fn id(&self) -> &str {
        &self.id
    }

    fn identity(&self) -> BotIdentity {
        self.identity.read().clone()
    }

    async fn call_api(&self, method: &str, params: Value) -> ApiResult<Value> {
        let params = (!params.is_null()).then_some(params);
        self.call(method, params.as_ref()).await
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl std::fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBot")
            .field("id", &self.id)
            .field("identity", &*self.identity.read())
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

/// Extracts the public numeric id from a `123456:secret` token.
fn bot_id_from_token(token: &str) -> String {
    match token.split_once(':') {
        Some((id, _)) if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) => {
            id.to_string()
        }
        _ => "bot".to_string(),
    }
}
