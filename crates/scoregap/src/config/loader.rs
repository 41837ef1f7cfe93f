use std::collections::HashSet;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};

use crate::config::schema::{Config, CredentialsConfig};
use crate::error::ConfigError;
use crate::secrets::resolve_secret;

/// Resolved OAuth client credentials for the scoring service.
#[derive(Debug)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.api.score_limit == 0 || config.api.score_limit > 100 {
        return Err(ConfigError::Validation {
            message: format!(
                "api.score_limit must be between 1 and 100, got {}",
                config.api.score_limit
            ),
        });
    }

    if config.api.ruleset.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "api.ruleset must not be empty".to_string(),
        });
    }

    if config.max_persistence_failures == 0 {
        return Err(ConfigError::Validation {
            message: "max_persistence_failures must be at least 1".to_string(),
        });
    }

    if let Some(search) = &config.search {
        if search.query.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "search.query must not be empty".to_string(),
            });
        }
        if search.max_pages == Some(0) {
            return Err(ConfigError::Validation {
                message: "search.max_pages must be at least 1".to_string(),
            });
        }
    }

    let missing = &config.missing_score;
    validate_country_code(&missing.target_country)?;
    if !missing.max_difficulty.is_finite() {
        return Err(ConfigError::Validation {
            message: format!(
                "missing_score.max_difficulty must be finite, got {}",
                missing.max_difficulty
            ),
        });
    }

    let countries = &config.leaderboard.countries;
    if countries.is_empty() {
        return Err(ConfigError::Validation {
            message: "leaderboard.countries must not be empty".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for country in countries {
        validate_country_code(&country.code)?;
        if !seen.insert(country.code.as_str()) {
            return Err(ConfigError::InvalidCountry {
                code: country.code.clone(),
                reason: "Duplicate country code".to_string(),
            });
        }
    }

    Ok(())
}

fn validate_country_code(code: &str) -> Result<(), ConfigError> {
    if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ConfigError::InvalidCountry {
            code: code.to_string(),
            reason: "Expected two uppercase ASCII letters".to_string(),
        });
    }
    Ok(())
}

/// Resolves both credentials. Either one missing is a startup-fatal error.
pub fn resolve_credentials(config: &CredentialsConfig) -> Result<Credentials, ConfigError> {
    let client_id = resolve_secret(
        config.client_id.as_deref(),
        config.client_id_file.as_deref(),
        config.client_id_env.as_deref(),
    )
    .map_err(|e| ConfigError::MissingCredential {
        name: "client_id",
        source: e,
    })?;

    let client_secret = resolve_secret(
        config.client_secret.as_deref(),
        config.client_secret_file.as_deref(),
        config.client_secret_env.as_deref(),
    )
    .map_err(|e| ConfigError::MissingCredential {
        name: "client_secret",
        source: e,
    })?;

    Ok(Credentials {
        client_id: client_id.expose_secret().to_string(),
        client_secret,
    })
}
