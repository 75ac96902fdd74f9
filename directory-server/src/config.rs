use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub store_timeout: Duration,
    pub max_resolve_batch: usize,
    /// Registry-authoritative deployments may choose player ids themselves.
    pub authoritative_player_ids: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port)?,
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            store_timeout: Duration::from_millis(env_or(
                "STORE_TIMEOUT_MS",
                defaults.store_timeout.as_millis() as u64,
            )?),
            max_resolve_batch: env_or("MAX_RESOLVE_BATCH", defaults.max_resolve_batch)?,
            authoritative_player_ids: env_or(
                "AUTHORITATIVE_PLAYER_IDS",
                defaults.authoritative_player_ids,
            )?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6000,
            database_url: "sqlite://game_directory.db?mode=rwc".to_string(),
            store_timeout: Duration::from_secs(5),
            max_resolve_batch: 64,
            authoritative_player_ids: false,
        }
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 6000);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert!(!config.authoritative_player_ids);
    }

    #[test]
    fn test_env_or_parses_and_reports_variable() {
        // Variable names unique to this test so parallel tests do not interfere
        unsafe {
            env::set_var("DIRECTORY_TEST_GOOD_PORT", "7001");
            env::set_var("DIRECTORY_TEST_BAD_PORT", "seventy");
        }

        assert_eq!(env_or("DIRECTORY_TEST_GOOD_PORT", 1u16).unwrap(), 7001);
        assert_eq!(env_or("DIRECTORY_TEST_UNSET_PORT", 1u16).unwrap(), 1);

        let err = env_or("DIRECTORY_TEST_BAD_PORT", 1u16).unwrap_err();
        assert!(err.to_string().contains("DIRECTORY_TEST_BAD_PORT"));
    }
}
