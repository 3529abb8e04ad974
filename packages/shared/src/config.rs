use std::env;

use thiserror::Error;

pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;
pub const MAX_SESSION_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings shared by the API server and the maintenance lambdas.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub users_table: String,
    pub games_table: String,
    pub sessions_table: String,
    pub session_ttl_seconds: i64,
    pub host: String,
    pub port: u16,
    pub cookie_secure: bool,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_seconds)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let session_ttl_seconds = match lookup("SESSION_TTL_SECONDS") {
            Some(value) => match value.parse::<i64>() {
                Ok(ttl) if ttl > 0 && ttl <= MAX_SESSION_TTL_SECONDS => ttl,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SESSION_TTL_SECONDS",
                        value,
                    })
                }
            },
            None => DEFAULT_SESSION_TTL_SECONDS,
        };

        let port = match lookup("PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: value.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        let cookie_secure = match lookup("COOKIE_SECURE").as_deref() {
            None | Some("") | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "COOKIE_SECURE",
                    value: other.to_string(),
                })
            }
        };

        Ok(Config {
            users_table: required("USERS_TABLE")?,
            games_table: required("GAMES_TABLE")?,
            sessions_table: required("SESSIONS_TABLE")?,
            session_ttl_seconds,
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            cookie_secure,
        })
    }
}
