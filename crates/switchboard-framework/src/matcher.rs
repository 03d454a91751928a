//! Match rules deciding whether a handler reaches an update.
//!
//! A [`MatchRule`] is a pure predicate over an [`Update`] and the bot's
//! [`BotIdentity`]. Rules never fail: a missing field, an unknown handler
//! type or an unknown match type all resolve to `false`.
//!
//! | Match type | Succeeds when |
//! |------------|---------------|
//! | `Exact` | the field equals the pattern |
//! | `Prefix` | the field starts with the pattern |
//! | `Contains` | the field contains the pattern |
//! | `Regexp` | the compiled regex finds a match anywhere in the field |
//! | `Command*` | see [`crate::command`] |

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use switchboard_core::{BotIdentity, Update};

use crate::command;

/// Which field of an update a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerType {
    /// `message.text`
    MessageText,
    /// `message.caption`
    PhotoCaption,
    /// `callback_query.data`
    CallbackQueryData,
    /// `callback_query.game_short_name`
    CallbackQueryGameShortName,
    /// Accepted at registration, never matches.
    Invalid,
}

impl HandlerType {
    /// Selects the inspected field, if the update carries it.
    pub fn field<'a>(&self, update: &'a Update) -> Option<&'a str> {
        match self {
            Self::MessageText => update.message.as_ref().map(|m| m.text.as_str()),
            Self::PhotoCaption => update.message.as_ref().map(|m| m.caption.as_str()),
            Self::CallbackQueryData => update.callback_query.as_ref().map(|q| q.data.as_str()),
            Self::CallbackQueryGameShortName => update
                .callback_query
                .as_ref()
                .map(|q| q.game_short_name.as_str()),
            Self::Invalid => None,
        }
    }
}

/// How a pattern is compared against the selected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchType {
    Exact,
    Prefix,
    Contains,
    /// Only meaningful with a compiled pattern, see [`MatchRule::Regexp`].
    Regexp,
    /// A bot command anywhere in the text.
    Command,
    /// A bot command at the start of the text.
    CommandStartOnly,
    /// A bot command at the start of the text, optionally addressed as
    /// `/command@bot_username`.
    CommandStartMaybeWithBotUsernameSuffix,
    /// Accepted at registration, never matches.
    Invalid,
}

impl MatchType {
    /// Returns `true` for the three bot-command variants.
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Self::Command | Self::CommandStartOnly | Self::CommandStartMaybeWithBotUsernameSuffix
        )
    }
}

/// A caller-supplied predicate over the whole update.
pub type MatchFunc = Arc<dyn Fn(&Update) -> bool + Send + Sync>;

/// The predicate attached to a handler.
///
/// Exactly one strategy is consulted per rule, which the enum shape
/// guarantees.
#[derive(Clone)]
pub enum MatchRule {
    /// A literal pattern compared with `match_type`.
    Pattern {
        handler_type: HandlerType,
        match_type: MatchType,
        pattern: String,
    },
    /// A compiled regular expression.
    Regexp { handler_type: HandlerType, regex: Regex },
    /// A free-form predicate; its result is passed through unchanged.
    Func(MatchFunc),
}

impl MatchRule {
    /// Creates a literal-pattern rule.
    pub fn pattern(
        handler_type: HandlerType,
        pattern: impl Into<String>,
        match_type: MatchType,
    ) -> Self {
        Self::Pattern {
            handler_type,
            match_type,
            pattern: pattern.into(),
        }
    }

    /// Creates a rule over a compiled regex.
    pub fn regexp(handler_type: HandlerType, regex: Regex) -> Self {
        Self::Regexp {
            handler_type,
            regex,
        }
    }

    /// Creates a rule from a predicate.
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Update) -> bool + Send + Sync + 'static,
    {
        Self::Func(Arc::new(f))
    }

    /// Evaluates the rule. Pure and total.
    pub fn matches(&self, update: &Update, identity: &BotIdentity) -> bool {
        match self {
            Self::Func(f) => f(update),
            Self::Regexp {
                handler_type,
                regex,
            } => handler_type
                .field(update)
                .is_some_and(|field| regex.is_match(field)),
            Self::Pattern {
                handler_type,
                match_type,
                pattern,
            } => match_pattern(*handler_type, *match_type, pattern, update, identity),
        }
    }
}

fn match_pattern(
    handler_type: HandlerType,
    match_type: MatchType,
    pattern: &str,
    update: &Update,
    identity: &BotIdentity,
) -> bool {
    if match_type.is_command() {
        if handler_type != HandlerType::MessageText {
            return false;
        }
        let Some(message) = &update.message else {
            return false;
        };
        return match match_type {
            MatchType::Command => command::matches_anywhere(message, pattern),
            MatchType::CommandStartOnly => command::matches_start_only(message, pattern),
            _ => command::matches_start_with_username(message, pattern, identity.username()),
        };
    }

    let Some(field) = handler_type.field(update) else {
        return false;
    };
    match match_type {
        MatchType::Exact => field == pattern,
        MatchType::Prefix => field.starts_with(pattern),
        MatchType::Contains => field.contains(pattern),
        // A literal pattern carries no compiled regex.
        _ => false,
    }
}

impl fmt::Debug for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern {
                handler_type,
                match_type,
                pattern,
            } => f
                .debug_struct("Pattern")
                .field("handler_type", handler_type)
                .field("match_type", match_type)
                .field("pattern", pattern)
                .finish(),
            Self::Regexp {
                handler_type,
                regex,
            } => f
                .debug_struct("Regexp")
                .field("handler_type", handler_type)
                .field("regex", &regex.as_str())
                .finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}
