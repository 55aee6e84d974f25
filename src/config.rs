use std::{str::FromStr, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub max_connections: u32,
    /// Idle time after which a participant may be evicted.
    pub participant_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite://batepapo.db?mode=rwc".to_owned(),
            port: 5000,
            max_connections: 16,
            participant_ttl: Duration::from_millis(10_000),
            sweep_interval: Duration::from_millis(15_000),
        }
    }
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> anyhow::Result<Config> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
        where
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            match lookup(key) {
                Some(raw) => raw.trim().parse().with_context(|| format!("{key}={raw:?}")),
                None => Ok(default),
            }
        }

        let defaults = Config::default();
        let ttl_ms = parsed(&lookup, "PARTICIPANT_TTL_MS", defaults.participant_ttl.as_millis() as u64)?;
        let interval_ms = parsed(&lookup, "SWEEP_INTERVAL_MS", defaults.sweep_interval.as_millis() as u64)?;
        anyhow::ensure!(interval_ms > 0, "SWEEP_INTERVAL_MS must be positive");

        Ok(Config {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            port: parsed(&lookup, "PORT", defaults.port)?,
            max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections)?,
            participant_ttl: Duration::from_millis(ttl_ms),
            sweep_interval: Duration::from_millis(interval_ms),
        })
    }
}
