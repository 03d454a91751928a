//! Layered loading of [`SwitchboardConfig`].
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. [`SwitchboardConfig::default`]
//! 2. `switchboard.<profile>.<ext>` next to the main file
//! 3. The main file: `switchboard.<ext>` or `config.<ext>`
//! 4. `SWITCHBOARD_*` environment variables
//! 5. [`ConfigLoader::merge`] / [`ConfigLoader::merge_provider`]
//!
//! `<ext>` is `toml` with the `toml-config` feature and `yaml`/`yml` with
//! `yaml-config`. The first directory holding a main file ends the search.
//!
//! Nested keys use `__` after the prefix, so `SWITCHBOARD_BOT__TOKEN` sets
//! `bot.token` and `SWITCHBOARD_LOGGING__LEVEL` sets `logging.level`.
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .file("./deploy/switchboard.toml")
//!     .load_validated()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::SwitchboardConfig;
use super::validation::validate_config;

const ENV_PREFIX: &str = "SWITCHBOARD_";
const PROFILE_ENV: &str = "SWITCHBOARD_PROFILE";

/// Main config file names, in search order.
const CONFIG_FILE_NAMES: &[&str] = &[
    #[cfg(feature = "toml-config")]
    "switchboard.toml",
    #[cfg(feature = "toml-config")]
    "config.toml",
    #[cfg(feature = "yaml-config")]
    "switchboard.yaml",
    #[cfg(feature = "yaml-config")]
    "switchboard.yml",
    #[cfg(feature = "yaml-config")]
    "config.yaml",
    #[cfg(feature = "yaml-config")]
    "config.yml",
];

/// Selects the `switchboard.<profile>.<ext>` overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Case-insensitive; `dev` and `prod` are accepted as short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `SWITCHBOARD_PROFILE`, defaulting to Development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds a [`SwitchboardConfig`] from files, environment and code.
pub struct ConfigLoader {
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Skips the directory search when set.
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::parse(&profile.into());
        self
    }

    /// Adds a directory to search for a main config file.
    ///
    /// With no directories added, the working directory and the user's
    /// `switchboard` config directory are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Loads exactly this file. A missing file is an error.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Ignores `SWITCHBOARD_*` variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration programmatically, on top of every other source.
    pub fn merge(mut self, config: SwitchboardConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Merges an arbitrary figment provider, on top of every other source.
    pub fn merge_provider<P: figment::Provider>(mut self, provider: P) -> Self {
        self.overrides = self.overrides.merge(provider);
        self
    }

    /// Loads and returns the configuration without validating it.
    pub fn load(self) -> ConfigResult<SwitchboardConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: SwitchboardConfig = figment.extract().map_err(|e| {
            ConfigError::ParseError(format!("Failed to extract configuration: {e}"))
        })?;

        debug!(
            profile = %profile,
            server_url = %config.bot.server_url,
            test_environment = config.bot.test_environment,
            sequential_handlers = config.bot.sequential_handlers,
            "Bot configuration resolved"
        );

        Ok(config)
    }

    /// Loads the configuration and validates it.
    pub fn load_validated(self) -> ConfigResult<SwitchboardConfig> {
        let config = self.load()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(SwitchboardConfig::default()));

        figment = match self.config_file.take() {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Reading bot configuration");
                merge_config_file(figment, &path)?
            }
            Some(path) => return Err(ConfigError::FileNotFound(path)),
            None => self.search_config_files(figment)?,
        };

        if self.load_env {
            trace!("Merging {ENV_PREFIX}* environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        let overrides = std::mem::take(&mut self.overrides);
        Ok(figment.merge(overrides))
    }

    fn search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join("switchboard")))
            .collect()
    }

    /// Merges the first main file found, preceded by its profile overlay.
    fn search_config_files(&self, figment: Figment) -> ConfigResult<Figment> {
        for dir in self.search_paths() {
            for name in CONFIG_FILE_NAMES {
                let main = dir.join(name);
                if !main.exists() {
                    continue;
                }

                let mut figment = figment;
                let overlay = self.profile_overlay(&main);
                if overlay.exists() {
                    debug!(path = %overlay.display(), profile = %self.profile, "Reading profile overlay");
                    figment = merge_config_file(figment, &overlay)?;
                }
                info!(path = %main.display(), "Reading bot configuration");
                return merge_config_file(figment, &main);
            }
        }

        warn!("No switchboard config file found, bot.token must come from the environment");
        Ok(figment)
    }

    /// `switchboard.toml` becomes `switchboard.<profile>.toml`.
    fn profile_overlay(&self, main: &Path) -> PathBuf {
        let stem = main.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let ext = main.extension().and_then(|e| e.to_str()).unwrap_or_default();
        main.with_file_name(format!("{stem}.{}.{ext}", self.profile))
    }
}

/// Dispatches on extension. Formats whose feature is disabled are rejected.
fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::ParseError(format!(
            "Unsupported or disabled configuration file format: .{ext}"
        ))),
    }
}

/// Loads configuration from the default locations and validates it.
pub fn load_config() -> ConfigResult<SwitchboardConfig> {
    ConfigLoader::new().load_validated()
}

/// Loads configuration from a specific file (plus environment) and validates it.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<SwitchboardConfig> {
    ConfigLoader::new().file(path).load_validated()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .unwrap();
            assert_eq!(config.logging.level.as_str(), "info");
            assert_eq!(config.bot.server_url, "https://api.telegram.org");
            Ok(())
        });
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("prod"), Profile::Production);
        assert_eq!(Profile::parse("DEV"), Profile::Development);
        assert_eq!(Profile::parse("staging"), Profile::Custom("staging".into()));
    }

    #[test]
    fn test_env_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("SWITCHBOARD_BOT__TOKEN", "123:ABC");
            jail.set_env("SWITCHBOARD_BOT__TEST_ENVIRONMENT", "true");
            jail.set_env("SWITCHBOARD_LOGGING__LEVEL", "debug");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load_validated()
                .unwrap();
            assert_eq!(config.bot.token, "123:ABC");
            assert!(config.bot.test_environment);
            assert_eq!(config.logging.level, LogLevel::Debug);
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_file_then_env_then_merge() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "switchboard.toml",
                r#"
                [bot]
                token = "from-file"
                username = "file_bot"
                check_init_timeout_ms = 1000

                [logging]
                level = "warn"
                "#,
            )?;
            jail.set_env("SWITCHBOARD_BOT__TOKEN", "from-env");

            let mut overrides = SwitchboardConfig::default();
            overrides.bot.token = "from-file".to_string();
            overrides.bot.username = Some("file_bot".to_string());
            overrides.bot.check_init_timeout_ms = 1000;
            overrides.logging.level = LogLevel::Error;

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .unwrap();
            assert_eq!(config.bot.token, "from-env");
            assert_eq!(config.bot.username.as_deref(), Some("file_bot"));
            assert_eq!(config.bot.check_init_timeout_ms, 1000);
            assert_eq!(config.logging.level, LogLevel::Warn);

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge(overrides)
                .load()
                .unwrap();
            assert_eq!(config.logging.level, LogLevel::Error);
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_is_overridden_by_main_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "switchboard.production.toml",
                r#"
                [bot]
                token = "profile"
                sequential_handlers = true
                "#,
            )?;
            jail.create_file("switchboard.toml", "[bot]\ntoken = \"main\"\n")?;

            let config = ConfigLoader::new()
                .profile("production")
                .search_path(jail.directory())
                .without_env()
                .load()
                .unwrap();
            assert_eq!(config.bot.token, "main");
            assert!(config.bot.sequential_handlers);
            Ok(())
        });
    }

    #[test]
    fn test_profile_overlay_sits_next_to_main_file() {
        let loader = ConfigLoader::new().profile("staging");
        assert_eq!(
            loader.profile_overlay(Path::new("/etc/bot/config.yml")),
            PathBuf::from("/etc/bot/config.staging.yml")
        );
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_first_directory_with_main_file_wins() {
        Jail::expect_with(|jail| {
            for dir in ["first", "second"] {
                std::fs::create_dir_all(jail.directory().join(dir)).map_err(|e| e.to_string())?;
            }
            jail.create_file("first/switchboard.toml", "[bot]\ntoken = \"first\"\n")?;
            jail.create_file("second/switchboard.toml", "[bot]\ntoken = \"second\"\n")?;

            let config = ConfigLoader::new()
                .search_path(jail.directory().join("empty"))
                .search_path(jail.directory().join("first"))
                .search_path(jail.directory().join("second"))
                .without_env()
                .load()
                .unwrap();
            assert_eq!(config.bot.token, "first");
            Ok(())
        });
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new()
            .file("/nonexistent/switchboard.toml")
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        Jail::expect_with(|jail| {
            jail.create_file("switchboard.ini", "token=1")?;
            let result = ConfigLoader::new()
                .file(jail.directory().join("switchboard.ini"))
                .without_env()
                .load();
            assert!(matches!(result, Err(ConfigError::ParseError(_))));
            Ok(())
        });
    }
}
