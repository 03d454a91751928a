use serde::{Deserialize, Serialize};

use super::{Message, User};

/// An incoming callback query from an inline keyboard button or a game.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackQuery {
    /// Unique query identifier.
    pub id: String,
    /// Sender.
    #[serde(default)]
    pub from: User,
    /// Message with the button that originated the query, if still available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// Identifier of the inline message that originated the query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
    /// Global identifier of the originating chat.
    #[serde(default)]
    pub chat_instance: String,
    /// Data attached to the button. Empty when absent.
    #[serde(default)]
    pub data: String,
    /// Short name of the game to be returned. Empty when absent.
    #[serde(default)]
    pub game_short_name: String,
}
