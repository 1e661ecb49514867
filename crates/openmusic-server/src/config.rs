use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Placeholder secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "secret", "changeme"];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} is unset or still a placeholder")]
    MissingSecret(&'static str),
    #[error("ACCESS_TOKEN_KEY and REFRESH_TOKEN_KEY must differ")]
    SharedSecret,
    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub access_token_key: String,
    pub refresh_token_key: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let access_token_key = secret(&get, "ACCESS_TOKEN_KEY")?;
        let refresh_token_key = secret(&get, "REFRESH_TOKEN_KEY")?;
        if access_token_key == refresh_token_key {
            return Err(ConfigError::SharedSecret);
        }

        let db_path = get("OPENMUSIC_DB_PATH").unwrap_or_else(|| "openmusic.db".into()).into();
        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = get("PORT").unwrap_or_else(|| "5000".into());

        let addr = format!("{}:{}", host, port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name: "HOST/PORT",
                value: format!("{}:{}", host, port),
            })?;

        Ok(Self {
            access_token_key,
            refresh_token_key,
            db_path,
            addr,
        })
    }
}

fn secret(get: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<String, ConfigError> {
    match get(name) {
        Some(value) if !value.is_empty() && !PLACEHOLDER_SECRETS.contains(&value.as_str()) => Ok(value),
        _ => Err(ConfigError::MissingSecret(name)),
    }
}
