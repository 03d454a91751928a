//! Inbound platform objects.
//!
//! # Hierarchy
//!
//! ```text
//! Update { update_id }
//! ├── message / edited_message: Message { text, caption, entities, ... }
//! │                              └── MessageEntity { type, offset, length }
//! └── callback_query: CallbackQuery { data, game_short_name, ... }
//! ```
//!
//! Every sub-object is optional. Code that inspects an update treats an absent
//! branch as a normal case, usually through [`Update::kind`].

mod callback_query;
mod message;
mod update;
mod user;

pub use callback_query::CallbackQuery;
pub use message::{Message, MessageEntity, MessageEntityType};
pub use update::{Update, UpdateKind};
pub use user::{Chat, User};
