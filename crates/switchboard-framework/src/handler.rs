//! Handlers: a match rule bound to a callback under a unique id.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use switchboard_core::{BotIdentity, BoxedBot, Update};
use uuid::Uuid;

use crate::matcher::MatchRule;

pub use futures::future::BoxFuture;

/// A type-erased handler callback.
///
/// The callback receives the bot that observed the update, so it can issue
/// further API calls, and a shared reference to the update.
pub type HandlerFunc = Arc<dyn Fn(BoxedBot, Arc<Update>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Adapts an async closure or function into a [`HandlerFunc`].
///
/// ```rust,ignore
/// let echo = handler_fn(|bot, update| async move {
///     let _ = bot.call_api("sendMessage", json!({ /* ... */ })).await;
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFunc
where
    F: Fn(BoxedBot, Arc<Update>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |bot: BoxedBot, update: Arc<Update>| f(bot, update).boxed())
}

/// Opaque identifier returned by registration.
///
/// Ids are random, so two registrations never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId(String);

impl HandlerId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HandlerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered handler.
pub struct Handler {
    id: HandlerId,
    rule: MatchRule,
    callback: HandlerFunc,
}

impl Handler {
    /// Creates a handler under the given id.
    pub fn new(id: HandlerId, rule: MatchRule, callback: HandlerFunc) -> Self {
        Self { id, rule, callback }
    }

    pub fn id(&self) -> &HandlerId {
        &self.id
    }

    pub fn rule(&self) -> &MatchRule {
        &self.rule
    }

    /// Returns a clone of the callback.
    pub fn callback(&self) -> HandlerFunc {
        Arc::clone(&self.callback)
    }

    /// Evaluates this handler's rule.
    pub fn matches(&self, update: &Update, identity: &BotIdentity) -> bool {
        self.rule.matches(update, identity)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("id", &self.id)
            .field("rule", &self.rule)
            .finish_non_exhaustive()
    }
}
