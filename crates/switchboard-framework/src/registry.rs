//! Concurrent-safe handler registry.
//!
//! Handlers are kept in registration order behind a [`parking_lot::RwLock`].
//! Registration and unregistration take the write lock only for the
//! push/remove itself; matching takes the read lock for the duration of one
//! rule evaluation pass, so an update always sees one consistent snapshot.

use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;
use switchboard_core::{BotIdentity, Update};
use tracing::{debug, warn};

use crate::handler::{Handler, HandlerFunc, HandlerId};
use crate::matcher::{HandlerType, MatchRule, MatchType};

/// Ordered collection of handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<Vec<Arc<Handler>>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a literal-pattern handler and returns its id.
    ///
    /// Invalid handler or match types are accepted; such handlers never match.
    /// So is [`MatchType::Regexp`], which needs a compiled pattern: use
    /// [`register_regexp`](Self::register_regexp) instead.
    pub fn register(
        &self,
        handler_type: HandlerType,
        pattern: impl Into<String>,
        match_type: MatchType,
        callback: HandlerFunc,
    ) -> HandlerId {
        let pattern = pattern.into();
        if match_type == MatchType::Regexp {
            warn!(
                pattern = %pattern,
                "Literal pattern registered with MatchType::Regexp never matches, use register_regexp"
            );
        }
        self.insert(MatchRule::pattern(handler_type, pattern, match_type), callback)
    }

    /// Registers a handler driven by a free-form predicate.
    pub fn register_match_func<F>(&self, match_fn: F, callback: HandlerFunc) -> HandlerId
    where
        F: Fn(&Update) -> bool + Send + Sync + 'static,
    {
        self.insert(MatchRule::func(match_fn), callback)
    }

    /// Registers a handler driven by a compiled regex.
    pub fn register_regexp(
        &self,
        handler_type: HandlerType,
        regex: Regex,
        callback: HandlerFunc,
    ) -> HandlerId {
        self.insert(MatchRule::regexp(handler_type, regex), callback)
    }

    /// Registers a handler with an arbitrary rule.
    pub fn insert(&self, rule: MatchRule, callback: HandlerFunc) -> HandlerId {
        let id = HandlerId::new();
        let handler = Arc::new(Handler::new(id.clone(), rule, callback));
        debug!(handler_id = %id, rule = ?handler.rule(), "Registering handler");

        self.handlers.write().push(handler);
        id
    }

    /// Removes the handler with the given id. Unknown ids are ignored.
    pub fn unregister(&self, id: &HandlerId) {
        let removed = {
            let mut handlers = self.handlers.write();
            let before = handlers.len();
            handlers.retain(|h| h.id() != id);
            before != handlers.len()
        };

        if removed {
            debug!(handler_id = %id, "Unregistered handler");
        }
    }

    /// Returns the handler with the given id, if registered.
    pub fn get(&self, id: &HandlerId) -> Option<Arc<Handler>> {
        self.handlers.read().iter().find(|h| h.id() == id).cloned()
    }

    /// Returns `true` if a handler with the given id is registered.
    pub fn contains(&self, id: &HandlerId) -> bool {
        self.handlers.read().iter().any(|h| h.id() == id)
    }

    /// Returns a copy of the current handler list.
    pub fn snapshot(&self) -> Vec<Arc<Handler>> {
        self.handlers.read().clone()
    }

    /// Returns every handler whose rule matches, in registration order.
    pub fn matching(&self, update: &Update, identity: &BotIdentity) -> Vec<Arc<Handler>> {
        self.handlers
            .read()
            .iter()
            .filter(|h| h.matches(update, identity))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handler_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use switchboard_core::CallbackQuery;

    fn noop() -> HandlerFunc {
        handler_fn(|_, _| async {})
    }

    #[test]
    fn test_register_unregister_handler() {
        let registry = HandlerRegistry::new();

        let id1 = registry.register(HandlerType::CallbackQueryData, "", MatchType::Exact, noop());
        let id2 = registry.register(HandlerType::CallbackQueryData, "", MatchType::Exact, noop());

        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&id1));
        assert!(registry.contains(&id2));

        registry.unregister(&id1);
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(&id1));
        assert!(registry.get(&id1).is_none());
        assert!(registry.contains(&id2));
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let registry = HandlerRegistry::new();
        registry.register(HandlerType::MessageText, "x", MatchType::Exact, noop());

        registry.unregister(&HandlerId::new());
        assert_eq!(registry.len(), 1);

        let empty = HandlerRegistry::new();
        empty.unregister(&HandlerId::new());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_invalid_types_are_accepted() {
        let registry = HandlerRegistry::new();
        let id = registry.register(HandlerType::Invalid, "", MatchType::Invalid, noop());
        assert!(registry.contains(&id));

        let update = Update {
            callback_query: Some(CallbackQuery {
                data: "123abc".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(registry.matching(&update, &BotIdentity::default()).is_empty());
    }

    #[test]
    fn test_literal_regexp_registration_is_inert() {
        let registry = HandlerRegistry::new();
        let literal = registry.register(
            HandlerType::CallbackQueryData,
            "^a",
            MatchType::Regexp,
            noop(),
        );
        let compiled = registry.register_regexp(
            HandlerType::CallbackQueryData,
            Regex::new("^a").unwrap(),
            noop(),
        );
        assert!(registry.contains(&literal));

        let update = Update {
            callback_query: Some(CallbackQuery {
                data: "abc".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let ids: Vec<_> = registry
            .matching(&update, &BotIdentity::default())
            .iter()
            .map(|h| h.id().clone())
            .collect();
        assert_eq!(ids, vec![compiled]);
    }

    struct Capture(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn captured_logs(f: impl FnOnce()) -> String {
        let buf = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let writer = Arc::clone(&buf);
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || Capture(Arc::clone(&writer)))
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let logs = buf.lock().clone();
        String::from_utf8(logs).unwrap()
    }

    #[test]
    fn test_literal_regexp_registration_warns() {
        let registry = HandlerRegistry::new();

        let logs = captured_logs(|| {
            registry.register(HandlerType::MessageText, "^a", MatchType::Regexp, noop());
        });
        assert!(logs.contains("WARN"));
        assert!(logs.contains("register_regexp"));

        let logs = captured_logs(|| {
            registry.register(HandlerType::MessageText, "a", MatchType::Prefix, noop());
        });
        assert!(logs.is_empty());
    }

    #[test]
    fn test_matching_keeps_registration_order() {
        let registry = HandlerRegistry::new();
        let a = registry.register_match_func(|_| true, noop());
        let _skip = registry.register_match_func(|_| false, noop());
        let c = registry.register_regexp(
            HandlerType::CallbackQueryData,
            Regex::new("^a").unwrap(),
            noop(),
        );

        let update = Update {
            callback_query: Some(CallbackQuery {
                data: "abc".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let ids: Vec<_> = registry
            .matching(&update, &BotIdentity::default())
            .iter()
            .map(|h| h.id().clone())
            .collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn test_concurrent_register_and_unregister() {
        let registry = Arc::new(HandlerRegistry::new());

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let id = registry.register(
                            HandlerType::MessageText,
                            "x",
                            MatchType::Exact,
                            noop(),
                        );
                        assert!(registry.contains(&id));
                        let _ = registry.matching(&Update::default(), &BotIdentity::default());
                        registry.unregister(&id);
                        assert!(!registry.contains(&id));
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert!(registry.is_empty());
    }
}
