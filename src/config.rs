use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Costs bcrypt accepts.
const BCRYPT_COSTS: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub data_file: PathBuf,
    pub bcrypt_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: num_cpus::get(),
            data_file: PathBuf::from("users.json"),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    /// Reads `TWITTER_API_*` variables, after loading a `.env` file if one
    /// is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let bcrypt_cost =
            parse(&lookup, "TWITTER_API_BCRYPT_COST")?.unwrap_or(defaults.bcrypt_cost);
        if !BCRYPT_COSTS.contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "TWITTER_API_BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }
        Ok(Self {
            host: lookup("TWITTER_API_HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "TWITTER_API_PORT")?.unwrap_or(defaults.port),
            workers: parse(&lookup, "TWITTER_API_WORKERS")?.unwrap_or(defaults.workers),
            data_file: lookup("TWITTER_API_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            bcrypt_cost,
        })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
