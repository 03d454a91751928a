//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, LogOutput, LoggingConfig, SwitchboardConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &SwitchboardConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates bot settings.
pub fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    validate_token(&bot.token)?;
    validate_url(&bot.server_url)?;

    if let Some(username) = &bot.username {
        validate_username(username)?;
    }

    if bot.check_init_timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Init check timeout must be greater than 0",
        ));
    }

    if bot.request_timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Request timeout must be greater than 0",
        ));
    }

    Ok(())
}

/// Validates the bot token without echoing it.
pub(crate) fn validate_token(token: &str) -> ConfigResult<()> {
    if token.is_empty() {
        return Err(ConfigError::missing_field("bot.token"));
    }

    // The token ends up in the request path, so it must be a single segment.
    if token.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(ConfigError::validation(
            "Bot token must not contain whitespace or '/'",
        ));
    }

    Ok(())
}

pub(crate) fn validate_username(username: &str) -> ConfigResult<()> {
    if username.starts_with('@') {
        return Err(ConfigError::validation(
            "Bot username must be given without the leading '@'",
        ));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

/// Validates the API server URL.
pub(crate) fn validate_url(url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::missing_field("bot.server_url"));
    }

    let valid_schemes = ["http://", "https://"];
    if !valid_schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {valid_schemes:?}"),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> SwitchboardConfig {
        let mut config = SwitchboardConfig::default();
        config.bot.token = "123:ABC".to_string();
        config
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_missing_token() {
        let config = SwitchboardConfig::default();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { ref field }) if field == "bot.token"
        ));
    }

    #[test]
    fn test_validate_token_with_whitespace_does_not_echo_it() {
        let mut config = valid_config();
        config.bot.token = "123 SECRET".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
        assert!(!err.to_string().contains("SECRET"));
    }

    #[test]
    fn test_validate_invalid_url() {
        let mut config = valid_config();
        config.bot.server_url = "ftp://example.com".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_validate_zero_timeouts() {
        let mut config = valid_config();
        config.bot.check_init_timeout_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.bot.request_timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_username_with_at() {
        let mut config = valid_config();
        config.bot.username = Some("@foo_bot".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_file_output_requires_path() {
        let mut config = valid_config();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { ref field }) if field == "logging.file_path"
        ));

        config.logging.file_path = Some("switchboard.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
