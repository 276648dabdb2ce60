use std::{env, net::SocketAddr};

use thiserror::Error;

pub const DEFAULT_API_KEY: &str = "password";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_key_is_default: bool,
    pub bind_addr: String,
    pub bind_port: u16,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // An empty key counts as unset; the fallback keeps the secret non-empty.
        let configured_key = lookup("MCP_API_KEY").filter(|key| !key.is_empty());
        let api_key_is_default = configured_key.is_none();
        let api_key = configured_key.unwrap_or_else(|| DEFAULT_API_KEY.to_string());

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port = lookup("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8787);

        let config = Self {
            api_key,
            api_key_is_default,
            bind_addr,
            bind_port,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}
