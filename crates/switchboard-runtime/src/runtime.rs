//! Bot instance orchestration.
//!
//! A [`Switchboard`] owns one bot: its transport, its handler registry and its
//! dispatcher. Instances are fully independent; several can live in one
//! process with different tokens and handler sets.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use switchboard_runtime::Switchboard;
//! use switchboard_framework::{HandlerType, MatchType, handler_fn};
//!
//! let bot = Switchboard::builder("123456:ABC").build()?;
//! bot.register_handler(
//!     HandlerType::MessageText,
//!     "start",
//!     MatchType::CommandStartMaybeWithBotUsernameSuffix,
//!     handler_fn(|bot, update| async move { /* ... */ }),
//! );
//! bot.init().await?;
//! bot.process_update(update).await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, info, trace, warn};

use crate::bot::TelegramBot;
use crate::config::{
    BotConfig, ConfigError, ConfigLoader, SwitchboardConfig, validate_config, validation,
};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use switchboard_core::{ApiResult, BotIdentity, BoxedBot, Message, Update, User};
use switchboard_framework::{
    DispatchOutcome, Dispatcher, ExecutionMode, HandlerFunc, HandlerId, HandlerRegistry,
    HandlerType, MatchType, Middleware, Regex,
};
use switchboard_transport::{HttpClient, Transport, TransportConfig};

/// One bot instance: transport, handler registry and dispatcher.
pub struct Switchboard {
    bot: Arc<TelegramBot>,
    dispatcher: Dispatcher,
    skip_get_me: bool,
    check_init_timeout: Duration,
}

impl Switchboard {
    /// Creates a builder for the given token.
    pub fn builder(token: impl Into<String>) -> SwitchboardBuilder {
        SwitchboardBuilder::new(token)
    }

    /// Creates an instance from a validated configuration.
    ///
    /// Also initializes logging from `config.logging` unless a subscriber is
    /// already installed.
    pub fn from_config(config: &SwitchboardConfig) -> RuntimeResult<Self> {
        validate_config(config)?;
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            test_environment = config.bot.test_environment,
            "Runtime initialized from configuration"
        );

        SwitchboardBuilder::from_bot_config(&config.bot).build()
    }

    /// Loads configuration from the current directory and the environment,
    /// then calls [`from_config`](Self::from_config).
    pub fn load() -> RuntimeResult<Self> {
        let config = ConfigLoader::new().with_current_dir().load()?;
        Self::from_config(&config)
    }

    /// Returns the underlying bot.
    pub fn bot(&self) -> &Arc<TelegramBot> {
        &self.bot
    }

    /// Returns the handler registry.
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        self.dispatcher.registry()
    }

    /// Returns the bot's current identity.
    pub fn identity(&self) -> BotIdentity {
        switchboard_core::Bot::identity(self.bot.as_ref())
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a literal-pattern handler.
    pub fn register_handler(
        &self,
        handler_type: HandlerType,
        pattern: impl Into<String>,
        match_type: MatchType,
        callback: HandlerFunc,
    ) -> HandlerId {
        self.registry()
            .register(handler_type, pattern, match_type, callback)
    }

    /// Registers a handler driven by a free-form predicate.
    pub fn register_handler_match_func<F>(&self, match_fn: F, callback: HandlerFunc) -> HandlerId
    where
        F: Fn(&Update) -> bool + Send + Sync + 'static,
    {
        self.registry().register_match_func(match_fn, callback)
    }

    /// Registers a handler driven by a compiled regex.
    pub fn register_handler_regexp(
        &self,
        handler_type: HandlerType,
        regex: Regex,
        callback: HandlerFunc,
    ) -> HandlerId {
        self.registry()
            .register_regexp(handler_type, regex, callback)
    }

    /// Removes a handler. Unknown ids are ignored.
    pub fn unregister_handler(&self, id: &HandlerId) {
        self.registry().unregister(id);
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Verifies the token with `getMe` and records the bot's username.
    ///
    /// Skipped when configured with `skip_get_me`. The call is bounded by the
    /// init check timeout.
    pub async fn init(&self) -> RuntimeResult<()> {
        if self.skip_get_me {
            debug!("Skipping getMe during initialization");
            return Ok(());
        }

        let me = tokio::time::timeout(self.check_init_timeout, self.bot.get_me())
            .await
            .map_err(|_| RuntimeError::InitTimeout(self.check_init_timeout))??;

        info!(
            bot_id = me.id,
            username = me.username.as_deref().unwrap_or(""),
            "Bot initialized"
        );
        Ok(())
    }

    /// Dispatches one update and waits for its handlers.
    pub async fn process_update(&self, update: Update) -> DispatchOutcome {
        let bot: BoxedBot = self.bot.clone();
        self.dispatcher.dispatch(Arc::new(update), bot).await
    }

    /// Dispatches one update on a new task.
    pub fn spawn_update(&self, update: Update) -> JoinHandle<DispatchOutcome> {
        tokio::spawn(self.dispatch_task(update))
    }

    /// Dispatches updates from `updates` until the stream ends or the bot is
    /// shut down. Each update runs on its own task. Finished tasks are reaped
    /// as the loop goes; returns once the remaining ones have finished.
    pub async fn run<S>(&self, updates: S)
    where
        S: Stream<Item = Update>,
    {
        let cancel = self.bot.cancellation_token().clone();
        let mut updates = std::pin::pin!(updates);
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Stopping update loop");
                    break;
                }
                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    report_task(result);
                }
                next = updates.next() => match next {
                    Some(update) => {
                        tasks.spawn(self.dispatch_task(update));
                    }
                    None => break,
                },
            }
        }

        trace!(pending = tasks.len(), "Waiting for in-flight updates");
        while let Some(result) = tasks.join_next().await {
            report_task(result);
        }
    }

    fn dispatch_task(&self, update: Update) -> BoxFuture<'static, DispatchOutcome> {
        let dispatcher = self.dispatcher.clone();
        let bot: BoxedBot = self.bot.clone();
        async move { dispatcher.dispatch(Arc::new(update), bot).await }.boxed()
    }

    /// Cancels in-flight API calls and stops [`run`](Self::run).
    pub fn shutdown(&self) {
        self.bot.shutdown();
    }

    // =========================================================================
    // API helpers
    // =========================================================================

    /// Calls `getMe` and records the returned username.
    pub async fn get_me(&self) -> ApiResult<User> {
        self.bot.get_me().await
    }

    /// Sends a text message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> ApiResult<Message> {
        self.bot.send_message(chat_id, text).await
    }

    /// Answers a callback query.
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> ApiResult<bool> {
        self.bot.answer_callback_query(callback_query_id, text).await
    }
}

impl std::fmt::Debug for Switchboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Switchboard")
            .field("bot", &self.bot)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

fn report_task(result: Result<DispatchOutcome, JoinError>) {
    if let Err(e) = result {
        warn!(error = %e, "Update task failed");
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Switchboard`].
pub struct SwitchboardBuilder {
    token: String,
    server_url: Option<String>,
    test_environment: bool,
    username: Option<String>,
    skip_get_me: bool,
    check_init_timeout: Duration,
    request_timeout: Duration,
    mode: ExecutionMode,
    default_handler: Option<HandlerFunc>,
    middlewares: Vec<Middleware>,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl SwitchboardBuilder {
    /// Creates a builder with default settings.
    pub fn new(token: impl Into<String>) -> Self {
        Self::from_bot_config(&BotConfig {
            token: token.into(),
            ..Default::default()
        })
    }

    /// Creates a builder from bot settings.
    pub fn from_bot_config(config: &BotConfig) -> Self {
        Self {
            token: config.token.clone(),
            server_url: Some(config.server_url.clone()),
            test_environment: config.test_environment,
            username: config.username.clone(),
            skip_get_me: config.skip_get_me,
            check_init_timeout: config.check_init_timeout(),
            request_timeout: config.request_timeout(),
            mode: if config.sequential_handlers {
                ExecutionMode::Sequential
            } else {
                ExecutionMode::Concurrent
            },
            default_handler: None,
            middlewares: Vec::new(),
            http_client: None,
        }
    }

    /// Sets the API server base URL.
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Addresses the platform's test environment.
    pub fn test_environment(mut self, enabled: bool) -> Self {
        self.test_environment = enabled;
        self
    }

    /// Sets the bot's username up front.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Skips `getMe` in [`Switchboard::init`].
    pub fn skip_get_me(mut self, skip: bool) -> Self {
        self.skip_get_me = skip;
        self
    }

    pub fn check_init_timeout(mut self, timeout: Duration) -> Self {
        self.check_init_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Runs matched handlers one after another.
    pub fn sequential_handlers(mut self, enabled: bool) -> Self {
        self.mode = if enabled {
            ExecutionMode::Sequential
        } else {
            ExecutionMode::Concurrent
        };
        self
    }

    /// Sets the handler invoked when nothing matches.
    pub fn default_handler(mut self, handler: HandlerFunc) -> Self {
        self.default_handler = Some(handler);
        self
    }

    /// Adds a middleware. The first one added is the outermost.
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Uses a custom HTTP client.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the instance.
    ///
    /// Applies the same token, URL, username and timeout checks as
    /// configuration validation.
    pub fn build(self) -> RuntimeResult<Switchboard> {
        self.validate()?;

        let mut transport_config = TransportConfig::new(self.token)
            .with_test_environment(self.test_environment)
            .with_timeout(self.request_timeout);
        if let Some(url) = self.server_url {
            transport_config = transport_config.with_server_url(url);
        }

        let transport = match self.http_client {
            Some(client) => Transport::new(transport_config, client),
            None => default_transport(transport_config)?,
        };

        let identity = BotIdentity {
            username: self.username,
        };
        let bot = Arc::new(TelegramBot::new(transport).with_identity(identity));

        let mut dispatcher =
            Dispatcher::new(Arc::new(HandlerRegistry::new())).with_mode(self.mode);
        if let Some(handler) = self.default_handler {
            dispatcher = dispatcher.with_default_handler(handler);
        }
        for middleware in self.middlewares {
            dispatcher = dispatcher.with_middleware(middleware);
        }

        debug!(bot = ?bot, mode = ?dispatcher.mode(), "Switchboard built");

        Ok(Switchboard {
            bot,
            dispatcher,
            skip_get_me: self.skip_get_me,
            check_init_timeout: self.check_init_timeout,
        })
    }
}

impl SwitchboardBuilder {
    fn validate(&self) -> RuntimeResult<()> {
        validation::validate_token(&self.token)?;
        if let Some(url) = &self.server_url {
            validation::validate_url(url)?;
        }
        if let Some(username) = &self.username {
            validation::validate_username(username)?;
        }
        if self.check_init_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(ConfigError::validation("Timeouts must be greater than 0").into());
        }
        Ok(())
    }
}

#[cfg(feature = "reqwest-client")]
fn default_transport(config: TransportConfig) -> RuntimeResult<Transport> {
    Ok(Transport::with_default_client(config)?)
}

#[cfg(not(feature = "reqwest-client"))]
fn default_transport(_config: TransportConfig) -> RuntimeResult<Transport> {
    Err(ConfigError::missing_field("http_client").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use switchboard_core::{ApiError, MessageEntity};
    use switchboard_framework::handler_fn;
    use switchboard_transport::{ClientError, HttpRequest, HttpResponse};

    /// Answers `getMe` with a fixed identity and everything else with `true`.
    #[derive(Default)]
    struct FakeApi {
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HttpClient for FakeApi {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
            let body = if request.url.ends_with("/getMe") {
                r#"{"ok":true,"result":{"id":1,"is_bot":true,"first_name":"Foo","username":"foo_bot"}}"#
            } else {
                r#"{"ok":true,"result":true}"#
            };
            self.urls.lock().push(request.url);
            Ok(HttpResponse::new(200, body))
        }
    }

    struct HangingApi;

    #[async_trait]
    impl HttpClient for HangingApi {
        async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ClientError> {
            std::future::pending().await
        }
    }

    fn command_update(text: &str) -> Update {
        Update {
            update_id: 9,
            message: Some(Message {
                text: text.to_string(),
                entities: vec![MessageEntity::bot_command(0, text.chars().count())],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn counting(counter: &Arc<AtomicUsize>) -> HandlerFunc {
        let counter = Arc::clone(counter);
        handler_fn(move |_, _| {
            let c = Arc::clone(&counter);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    #[test]
    fn test_build_requires_token() {
        let err = Switchboard::builder("").build().unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Config(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_build_validates_settings() {
        let build_err = |builder: SwitchboardBuilder| match builder.build() {
            Err(RuntimeError::Config(e)) => e,
            other => panic!("expected a config error, got {other:?}"),
        };

        let err = build_err(Switchboard::builder("1/x"));
        assert!(matches!(err, ConfigError::ValidationError { .. }));
        assert!(!err.to_string().contains("1/x"));

        let err = build_err(Switchboard::builder("1:XXX").username("@foo_bot"));
        assert!(matches!(err, ConfigError::ValidationError { .. }));

        let err = build_err(Switchboard::builder("1:XXX").server_url("localhost"));
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));

        let err = build_err(Switchboard::builder("1:XXX").request_timeout(Duration::ZERO));
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_from_config_validates() {
        let mut config = SwitchboardConfig::default();
        config.bot.token = "123:ABC".to_string();
        config.bot.server_url = "localhost".to_string();
        assert!(matches!(
            Switchboard::from_config(&config),
            Err(RuntimeError::Config(ConfigError::InvalidUrl { .. }))
        ));
    }

    #[tokio::test]
    async fn test_init_records_username_for_command_matching() {
        let api = Arc::new(FakeApi::default());
        let switchboard = Switchboard::builder("1:XXX")
            .server_url("http://localhost:8081")
            .test_environment(true)
            .http_client(api.clone())
            .build()
            .unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        switchboard.register_handler(
            HandlerType::MessageText,
            "foo",
            MatchType::CommandStartMaybeWithBotUsernameSuffix,
            counting(&counter),
        );

        let outcome = switchboard.process_update(command_update("/foo@foo_bot")).await;
        assert!(!outcome.is_matched());

        switchboard.init().await.unwrap();
        assert_eq!(switchboard.identity().username(), Some("foo_bot"));
        assert_eq!(
            api.urls.lock()[0],
            "http://localhost:8081/bot1:XXX/test/getMe"
        );

        let outcome = switchboard.process_update(command_update("/foo@foo_bot")).await;
        assert_eq!(outcome.matched, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_init_skip_get_me() {
        let api = Arc::new(FakeApi::default());
        let switchboard = Switchboard::builder("1:XXX")
            .skip_get_me(true)
            .username("preset_bot")
            .http_client(api.clone())
            .build()
            .unwrap();

        switchboard.init().await.unwrap();
        assert!(api.urls.lock().is_empty());
        assert_eq!(switchboard.identity().username(), Some("preset_bot"));
    }

    #[tokio::test]
    async fn test_init_timeout() {
        let switchboard = Switchboard::builder("1:XXX")
            .check_init_timeout(Duration::from_millis(20))
            .http_client(Arc::new(HangingApi))
            .build()
            .unwrap();

        let err = switchboard.init().await.unwrap_err();
        assert!(matches!(err, RuntimeError::InitTimeout(_)));
    }

    #[tokio::test]
    async fn test_register_and_unregister() {
        let switchboard = Switchboard::builder("1:XXX")
            .http_client(Arc::new(FakeApi::default()))
            .build()
            .unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        let id = switchboard.register_handler_regexp(
            HandlerType::MessageText,
            Regex::new("^/f").unwrap(),
            counting(&counter),
        );
        switchboard.register_handler_match_func(|u| u.update_id == 9, counting(&counter));

        let outcome = switchboard.process_update(command_update("/foo")).await;
        assert_eq!(outcome.matched, 2);

        switchboard.unregister_handler(&id);
        switchboard.unregister_handler(&id);
        let outcome = switchboard
            .spawn_update(command_update("/foo"))
            .await
            .unwrap();
        assert_eq!(outcome.matched, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_default_handler_from_builder() {
        let fallback = Arc::new(AtomicUsize::new(0));
        let switchboard = Switchboard::builder("1:XXX")
            .http_client(Arc::new(FakeApi::default()))
            .default_handler(counting(&fallback))
            .build()
            .unwrap();

        let outcome = switchboard.process_update(Update::default()).await;
        assert!(outcome.default_invoked);
        assert_eq!(fallback.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_processes_stream() {
        let counter = Arc::new(AtomicUsize::new(0));
        let switchboard = Switchboard::builder("1:XXX")
            .http_client(Arc::new(FakeApi::default()))
            .build()
            .unwrap();
        switchboard.register_handler_match_func(|_| true, counting(&counter));

        let updates = futures::stream::iter((0..5).map(|id| Update {
            update_id: id,
            ..Default::default()
        }));
        switchboard.run(updates).await;

        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_run_long_stream_handles_every_update() {
        let seen = Arc::new(Mutex::new(std::collections::HashSet::new()));
        let switchboard = Switchboard::builder("1:XXX")
            .http_client(Arc::new(FakeApi::default()))
            .build()
            .unwrap();
        let record = Arc::clone(&seen);
        switchboard.register_handler_match_func(
            |_| true,
            handler_fn(move |_, update| {
                let record = Arc::clone(&record);
                async move {
                    record.lock().insert(update.update_id);
                }
            }),
        );

        // Yield between updates so tasks finish while the stream is still open.
        let updates = futures::stream::iter(0..1000).then(|id| async move {
            tokio::task::yield_now().await;
            Update {
                update_id: id,
                ..Default::default()
            }
        });
        switchboard.run(updates).await;

        let seen = seen.lock();
        assert_eq!(seen.len(), 1000);
        assert!((0..1000).all(|id| seen.contains(&id)));
    }

    #[tokio::test]
    async fn test_shutdown_stops_run_and_cancels_calls() {
        let switchboard = Switchboard::builder("1:XXX")
            .http_client(Arc::new(HangingApi))
            .build()
            .unwrap();

        switchboard.shutdown();
        switchboard.run(futures::stream::pending::<Update>()).await;

        let err = switchboard.send_message(1, "hi").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(ref t) if t.is_cancelled()));
    }
}
