use anyhow::{anyhow, Result};
use std::env;
use std::str::FromStr;

pub trait ProviderConfig {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self>
    where
        Self: Sized;

    /// Helper function to get environment variables with error handling
    fn get_env(key: &str, required: bool, default: Option<String>) -> Result<Option<String>> {
        match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) if !required => Ok(default),
            Err(env::VarError::NotPresent) => Err(anyhow!(
                "Environment variable '{}' is required but not set.",
                key
            )),
            Err(e) => Err(anyhow!("Environment variable '{}' is not valid: {}", key, e)),
        }
    }

    /// Like `get_env`, parsing the value when present
    fn parse_env<T>(key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match Self::get_env(key, false, None)? {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| anyhow!("Environment variable '{}' has invalid value '{}': {}", key, raw, e)),
            None => Ok(None),
        }
    }
}
