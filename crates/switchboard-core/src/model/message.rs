use serde::{Deserialize, Serialize};

use super::{Chat, User};

/// A message sent to or by the bot.
///
/// `text` and `caption` default to the empty string when the platform omits
/// them, so callers never have to unwrap them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier inside the chat.
    #[serde(default)]
    pub message_id: i64,
    /// Unix timestamp the message was sent at.
    #[serde(default)]
    pub date: i64,
    /// Chat the message belongs to.
    #[serde(default)]
    pub chat: Chat,
    /// Sender, empty for channel posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    /// Text of a text message.
    #[serde(default)]
    pub text: String,
    /// Caption of a media message.
    #[serde(default)]
    pub caption: String,
    /// Special entities in `text`.
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
    /// Special entities in `caption`.
    #[serde(default)]
    pub caption_entities: Vec<MessageEntity>,
}

impl Message {
    /// Iterates over the bot-command entities in `text`.
    pub fn bot_commands(&self) -> impl Iterator<Item = &MessageEntity> {
        self.entities
            .iter()
            .filter(|e| e.kind == MessageEntityType::BotCommand)
    }
}

/// Kind of a [`MessageEntity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageEntityType {
    Mention,
    Hashtag,
    Cashtag,
    BotCommand,
    Url,
    Email,
    PhoneNumber,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Blockquote,
    ExpandableBlockquote,
    Code,
    Pre,
    TextLink,
    TextMention,
    CustomEmoji,
    /// An entity kind added to the platform after this crate was written.
    #[serde(other)]
    Unknown,
}

/// A span of message text annotated by the platform.
///
/// `offset` and `length` count UTF-16 code units, as the platform does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    /// Kind of the entity.
    #[serde(rename = "type")]
    pub kind: MessageEntityType,
    /// Offset in UTF-16 code units to the start of the entity.
    pub offset: usize,
    /// Length of the entity in UTF-16 code units.
    pub length: usize,
    /// For `text_link` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// For `text_mention` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// For `pre` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// For `custom_emoji` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_emoji_id: Option<String>,
}

impl MessageEntity {
    /// Creates an entity with no optional attributes.
    pub fn new(kind: MessageEntityType, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
            url: None,
            user: None,
            language: None,
            custom_emoji_id: None,
        }
    }

    /// Shorthand for a `bot_command` entity.
    pub fn bot_command(offset: usize, length: usize) -> Self {
        Self::new(MessageEntityType::BotCommand, offset, length)
    }

    /// Returns the part of `text` this entity covers.
    ///
    /// Returns `None` if the span runs past the end of `text` or cuts a
    /// surrogate pair in half.
    pub fn extract<'a>(&self, text: &'a str) -> Option<&'a str> {
        let end = self.offset.checked_add(self.length)?;
        let start = utf16_to_byte_index(text, self.offset)?;
        let end = utf16_to_byte_index(text, end)?;
        text.get(start..end)
    }
}

/// Maps a UTF-16 code unit position onto a byte index in `text`.
fn utf16_to_byte_index(text: &str, target: usize) -> Option<usize> {
    let mut units = 0;
    for (idx, ch) in text.char_indices() {
        if units == target {
            return Some(idx);
        }
        if units > target {
            return None;
        }
        units += ch.len_utf16();
    }
    (units == target).then_some(text.len())
}
