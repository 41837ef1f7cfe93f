//! Credential resolution from multiple sources.
//!
//! The scoring-service client id and secret can come from:
//!
//! 1. **Direct value** in the config file (quick local runs)
//! 2. **File reference** (e.g. `client_secret_file: ~/.config/scoregap/secret`)
//! 3. **Env var reference** (`CLIENT_ID` / `CLIENT_SECRET` by default)
//!
//! Env vars may also be declared in a local `.env` file, see
//! [`load_env_file`].

use secrecy::SecretString;
use std::fs;
use std::path::Path;

/// Error type for secret resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Secret file '{path}' is empty")]
    EmptyFile { path: String },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' is empty")]
    EnvVarEmpty { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },

    #[error("Failed to load environment file '{path}': {message}")]
    EnvFile { path: String, message: String },
}

/// Result type for secret resolution.
pub type Result<T> = std::result::Result<T, SecretError>;

/// Resolves a secret from multiple sources in priority order:
/// 1. Direct value (if provided and non-empty)
/// 2. File contents (if path provided)
/// 3. Environment variable (if name provided)
///
/// A source that is configured but yields an empty value is an error rather
/// than a fall-through, so a blank `CLIENT_SECRET=` is reported as such.
///
/// ```ignore
/// use scoregap::secrets::resolve_secret;
///
/// let secret = resolve_secret(None, None, Some("CLIENT_SECRET"))?;
/// ```
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct {
        if !value.is_empty() {
            return Ok(SecretString::from(value.to_string()));
        }
    }

    if let Some(path) = file_path {
        if !path.is_empty() {
            let expanded = expand_home(path);
            let content = fs::read_to_string(&expanded).map_err(|e| SecretError::FileReadError {
                path: expanded.clone(),
                source: e,
            })?;
            let trimmed = content.trim();
            if trimmed.is_empty() {
                return Err(SecretError::EmptyFile { path: expanded });
            }
            return Ok(SecretString::from(trimmed.to_string()));
        }
    }

    if let Some(var_name) = env_var {
        if !var_name.is_empty() {
            return match std::env::var(var_name) {
                Ok(value) => {
                    // Trim whitespace for consistency (env vars may have trailing newlines)
                    let trimmed = value.trim();
                    if trimmed.is_empty() {
                        Err(SecretError::EnvVarEmpty {
                            name: var_name.to_string(),
                        })
                    } else {
                        Ok(SecretString::from(trimmed))
                    }
                }
                Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                    name: var_name.to_string(),
                }),
                Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                    name: var_name.to_string(),
                }),
            };
        }
    }

    Err(SecretError::NoSourceProvided)
}

/// Loads `KEY=value` lines from a dotenv file into the process environment.
/// Variables that are already set keep their value. Returns whether the file
/// existed.
pub fn load_env_file(path: &Path) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(SecretError::EnvFile {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}

/// Expands `~` to the user's home directory.
///
/// Checks HOME (Unix) then USERPROFILE (Windows). `~user/path` is not
/// supported.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            if path == "~" {
                return home.to_string_lossy().into_owned();
            }
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
