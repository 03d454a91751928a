//! Bot-command matching over message entities.
//!
//! A command is located through the `bot_command` entities the platform
//! attaches to a message, never by scanning the text. Entity offsets are in
//! UTF-16 code units; see [`MessageEntity::extract`].

use switchboard_core::{Message, MessageEntity};

/// Returns the command text of an entity without its leading `/`.
fn command_body<'a>(message: &'a Message, entity: &MessageEntity) -> Option<&'a str> {
    entity.extract(&message.text)?.strip_prefix('/')
}

/// Any bot-command entity, at any offset, names `pattern`.
pub fn matches_anywhere(message: &Message, pattern: &str) -> bool {
    message
        .bot_commands()
        .any(|e| command_body(message, e) == Some(pattern))
}

/// A bot-command entity at offset 0 names `pattern`.
///
/// An `@username` suffix is not tolerated.
pub fn matches_start_only(message: &Message, pattern: &str) -> bool {
    message
        .bot_commands()
        .filter(|e| e.offset == 0)
        .any(|e| command_body(message, e) == Some(pattern))
}

/// A bot-command entity at offset 0 is exactly `/pattern`, or
/// `/pattern@username` when the bot knows its own username.
pub fn matches_start_with_username(
    message: &Message,
    pattern: &str,
    username: Option<&str>,
) -> bool {
    message
        .bot_commands()
        .filter(|e| e.offset == 0)
        .filter_map(|e| command_body(message, e))
        .any(|body| {
            let Some(rest) = body.strip_prefix(pattern) else {
                return false;
            };
            if rest.is_empty() {
                return true;
            }
            match (rest.strip_prefix('@'), username) {
                (Some(suffix), Some(username)) => suffix == username,
                _ => false,
            }
        })
}
