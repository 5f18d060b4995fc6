use std::str::FromStr;

use thiserror::Error;

/// Errors raised while reading settings from the process environment.
#[derive(Debug, Error)]
pub enum EnvVarError {
    /// A variable the caller requires is not set.
    #[error("Missing environment variable: {0}")]
    Missing(String),

    /// A variable is set but does not parse as the requested type.
    #[error("Environment variable {name} has an invalid value {value:?}")]
    Invalid { name: String, value: String },
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// Empty values count as missing; a blank `ALPHAVANTAGE_API_KEY=` in a shell
/// profile should not be mistaken for a usable key.
pub fn get_env_var(name: &str) -> Result<String, EnvVarError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(EnvVarError::Missing(name.to_string())),
    }
}

/// Reads an optional environment variable. `None` when unset or blank.
pub fn get_env_var_opt(name: &str) -> Option<String> {
    get_env_var(name).ok()
}

/// Reads and parses an optional environment variable.
///
/// Returns `Ok(None)` when unset, and an error when set to something that does
/// not parse as `T`.
pub fn parse_env_var<T: FromStr>(name: &str) -> Result<Option<T>, EnvVarError> {
    match get_env_var_opt(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| EnvVarError::Invalid {
                name: name.to_string(),
                value,
            }),
    }
}
