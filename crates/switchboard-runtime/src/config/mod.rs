//! Configuration module for the Switchboard runtime.
//!
//! Layered loading (defaults, files, environment) through figment, plus
//! validation of the bot and logging settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, SpanEventConfig,
    SwitchboardConfig,
};
pub use validation::validate_config;
