use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::ledger::{LedgerConfig, DEFAULT_MAX_VOTE_AGE, DEFAULT_QUORUM};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 10040;

/// Settings for the validator node, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the node's validator key pair.
    pub key_dir: PathBuf,
    pub ledger: LedgerConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            key_dir: PathBuf::from("."),
            ledger: LedgerConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the config from any variable source; unset variables keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let quorum = match lookup("LEDGER_QUORUM") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(quorum) if quorum >= DEFAULT_QUORUM => quorum,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "LEDGER_QUORUM",
                        value,
                    })
                }
            },
            None => DEFAULT_QUORUM,
        };
        let max_age_secs: u64 = parse_var(&lookup, "LEDGER_MAX_VOTE_AGE_SECS")?
            .unwrap_or(DEFAULT_MAX_VOTE_AGE.as_secs());

        Ok(Self {
            host: lookup("SERVER_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "SERVER_PORT")?.unwrap_or(defaults.port),
            key_dir: lookup("VALIDATOR_KEY_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.key_dir),
            ledger: LedgerConfig {
                quorum,
                max_vote_age: Duration::from_secs(max_age_secs),
            },
        })
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        None => Ok(None),
    }
}
