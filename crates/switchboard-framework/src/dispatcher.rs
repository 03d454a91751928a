//! Update dispatcher.
//!
//! The [`Dispatcher`] receives one update at a time and hands it to every
//! registered handler whose rule matches:
//!
//! 1. The matching set is computed from a single read-locked pass over the
//!    registry, so concurrent (un)registration never produces a torn view
//! 2. Every matching callback runs; no handler can stop the others
//! 3. If nothing matched, the default handler (if any) runs instead
//!
//! ```rust,ignore
//! use switchboard_framework::{Dispatcher, HandlerRegistry, handler_fn};
//!
//! let dispatcher = Dispatcher::new(registry)
//!     .with_default_handler(handler_fn(|_, update| async move {
//!         tracing::debug!(update_id = update.update_id, "unhandled update");
//!     }))
//!     .with_middleware(logging_middleware);
//!
//! let outcome = dispatcher.dispatch(update, bot).await;
//! ```

use std::sync::Arc;

use futures::future::join_all;
use switchboard_core::{BoxedBot, Update};
use tracing::{Instrument, Level, debug, span, trace};

use crate::handler::HandlerFunc;
use crate::registry::HandlerRegistry;

/// Wraps a callback in another callback.
///
/// Middlewares apply to every matched callback and to the default handler.
pub type Middleware = Arc<dyn Fn(HandlerFunc) -> HandlerFunc + Send + Sync>;

/// How matched callbacks are driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// All matched callbacks are polled concurrently.
    #[default]
    Concurrent,
    /// Matched callbacks run one after another in registration order.
    Sequential,
}

/// What happened to one dispatched update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Number of handlers whose rule matched and whose callback ran.
    pub matched: usize,
    /// Whether the default handler ran.
    pub default_invoked: bool,
}

impl DispatchOutcome {
    /// Returns `true` if at least one registered handler matched.
    pub fn is_matched(&self) -> bool {
        self.matched > 0
    }
}

/// Routes updates to matching handlers.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    mode: ExecutionMode,
    default_handler: Option<HandlerFunc>,
    middlewares: Vec<Middleware>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given registry.
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            mode: ExecutionMode::default(),
            default_handler: None,
            middlewares: Vec::new(),
        }
    }

    /// Sets how matched callbacks are driven.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the handler invoked when no registered handler matches.
    pub fn with_default_handler(mut self, handler: HandlerFunc) -> Self {
        self.default_handler = Some(handler);
        self
    }

    /// Adds a middleware. The first middleware added is the outermost.
    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Returns the registry this dispatcher reads from.
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    fn wrap(&self, callback: HandlerFunc) -> HandlerFunc {
        self.middlewares
            .iter()
            .rev()
            .fold(callback, |inner, middleware| middleware(inner))
    }

    /// Dispatches one update and waits for every invoked callback.
    pub async fn dispatch(&self, update: Arc<Update>, bot: BoxedBot) -> DispatchOutcome {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            update_id = update.update_id,
            kind = update.kind_name()
        );

        self.dispatch_inner(update, bot).instrument(span).await
    }

    async fn dispatch_inner(&self, update: Arc<Update>, bot: BoxedBot) -> DispatchOutcome {
        let identity = bot.identity();
        let matched = self.registry.matching(&update, &identity);

        if matched.is_empty() {
            let Some(default) = &self.default_handler else {
                trace!("No handler matched");
                return DispatchOutcome::default();
            };
            debug!("No handler matched, invoking default handler");
            self.wrap(Arc::clone(default))(bot, update).await;
            return DispatchOutcome {
                matched: 0,
                default_invoked: true,
            };
        }

        let callbacks: Vec<HandlerFunc> = matched
            .iter()
            .map(|handler| {
                debug!(handler_id = %handler.id(), "Handler matched");
                self.wrap(handler.callback())
            })
            .collect();

        match self.mode {
            ExecutionMode::Concurrent => {
                join_all(
                    callbacks
                        .iter()
                        .map(|callback| callback(Arc::clone(&bot), Arc::clone(&update))),
                )
                .await;
            }
            ExecutionMode::Sequential => {
                for callback in &callbacks {
                    callback(Arc::clone(&bot), Arc::clone(&update)).await;
                }
            }
        }

        DispatchOutcome {
            matched: callbacks.len(),
            default_invoked: false,
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handler_count", &self.registry.len())
            .field("mode", &self.mode)
            .field("default_handler", &self.default_handler.is_some())
            .field("middleware_count", &self.middlewares.len())
            .finish()
    }
}
