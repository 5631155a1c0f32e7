use std::net::SocketAddr;
use std::path::PathBuf;

/// Token secrets that must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60;
const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("QUILL_JWT_SECRET is unset or still a placeholder")]
    MissingSecret,

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("QUILL_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::MissingSecret);
        }

        let db_path = lookup("QUILL_DB_PATH").unwrap_or_else(|| "quill.db".into());

        let token_ttl = match lookup("QUILL_TOKEN_TTL_SECS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|secs| (1..=MAX_TOKEN_TTL_SECS).contains(secs))
                .and_then(chrono::Duration::try_seconds)
                .ok_or(ConfigError::Invalid {
                    key: "QUILL_TOKEN_TTL_SECS",
                    value: raw,
                })?,
            None => chrono::Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
        };

        let host = lookup("QUILL_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = lookup("QUILL_PORT").unwrap_or_else(|| "3001".into());
        let addr_raw = format!("{}:{}", host, port);
        let addr = addr_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "QUILL_HOST/QUILL_PORT",
            value: addr_raw,
        })?;

        Ok(Self {
            db_path: db_path.into(),
            jwt_secret,
            token_ttl,
            addr,
        })
    }
}
