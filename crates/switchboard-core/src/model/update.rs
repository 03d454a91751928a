use serde::{Deserialize, Serialize};

use super::{CallbackQuery, Message};

/// One inbound event from the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Update {
    /// Monotonic update identifier.
    pub update_id: i64,
    /// A new incoming message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// A new version of a message that was edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,
    /// An incoming callback query from an inline keyboard button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
}

/// Borrowed view of which branch an [`Update`] carries.
#[derive(Debug, Clone, Copy)]
pub enum UpdateKind<'a> {
    Message(&'a Message),
    EditedMessage(&'a Message),
    CallbackQuery(&'a CallbackQuery),
    /// A shape this crate does not model yet.
    Unknown,
}

impl Update {
    /// Returns the populated branch of this update.
    pub fn kind(&self) -> UpdateKind<'_> {
        if let Some(msg) = &self.message {
            UpdateKind::Message(msg)
        } else if let Some(msg) = &self.edited_message {
            UpdateKind::EditedMessage(msg)
        } else if let Some(query) = &self.callback_query {
            UpdateKind::CallbackQuery(query)
        } else {
            UpdateKind::Unknown
        }
    }

    /// Returns a short name for the populated branch, for logging.
    pub fn kind_name(&self) -> &'static str {
        match self.kind() {
            UpdateKind::Message(_) => "message",
            UpdateKind::EditedMessage(_) => "edited_message",
            UpdateKind::CallbackQuery(_) => "callback_query",
            UpdateKind::Unknown => "unknown",
        }
    }
}
