use crate::error::AppError;
use serde::Deserialize;
use std::env;

/// Settings every service shares.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Read the listen port from a service-specific environment
    /// variable. An unset variable means the default; a set but
    /// unparseable one is a startup error.
    pub fn from_port_var(var: &str, default: u16) -> Result<Self, AppError> {
        let port = match env::var(var) {
            Ok(raw) => raw.parse().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("{} is not a valid port: {}", var, e))
            })?,
            Err(_) => default,
        };

        Ok(Self { port })
    }
}
