use crate::core::{
    HashMode, LedgerParams, Miner, DEFAULT_MAX_NONCE, INITIAL_DIFFICULTY, LEGACY_DIFFICULTY,
};
use crate::error::{BlockchainError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;

const DIFFICULTY_KEY: &str = "TALLY_DIFFICULTY";
const MINING_REWARD_KEY: &str = "TALLY_MINING_REWARD";
const MAX_NONCE_KEY: &str = "TALLY_MAX_NONCE";
const WORKERS_KEY: &str = "TALLY_WORKERS";
const HASH_MODE_KEY: &str = "TALLY_HASH_MODE";

const DEFAULT_MINING_REWARD: u64 = 10;

/// Node settings, passed explicitly to the ledger and the miner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub difficulty: u32,
    pub mining_reward: u64,
    pub max_nonce: u64,
    pub workers: usize,
    pub hash_mode: HashMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            difficulty: INITIAL_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            max_nonce: DEFAULT_MAX_NONCE,
            workers: 1,
            hash_mode: HashMode::Modern,
        }
    }
}

impl Config {
    /// Defaults overlaid with any `TALLY_*` environment variables
    pub fn new() -> Result<Config> {
        Config::default().with_env_overrides()
    }

    /// Missing keys fall back to their defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Config> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Config> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_env_overrides(self) -> Result<Config> {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup, e.g. the process environment
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(DIFFICULTY_KEY) {
            self.difficulty = parse_setting(DIFFICULTY_KEY, &value)?;
        }
        if let Some(value) = lookup(MINING_REWARD_KEY) {
            self.mining_reward = parse_setting(MINING_REWARD_KEY, &value)?;
        }
        if let Some(value) = lookup(MAX_NONCE_KEY) {
            self.max_nonce = parse_setting(MAX_NONCE_KEY, &value)?;
        }
        if let Some(value) = lookup(WORKERS_KEY) {
            self.workers = parse_setting(WORKERS_KEY, &value)?;
        }
        if let Some(value) = lookup(HASH_MODE_KEY) {
            self.hash_mode = HashMode::from_str(value.trim()).map_err(BlockchainError::Config)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_nonce == 0 {
            return Err(BlockchainError::Config(
                "Max nonce must be positive".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(BlockchainError::Config(
                "Worker count must be positive".to_string(),
            ));
        }
        self.ledger_params().validate()
    }

    /// Legacy mode pins difficulty 4 and never mints, whatever is configured
    pub fn ledger_params(&self) -> LedgerParams {
        match self.hash_mode {
            HashMode::Legacy => LedgerParams::legacy(),
            HashMode::Modern => LedgerParams {
                difficulty: self.difficulty,
                mining_reward: self.mining_reward,
                hash_mode: HashMode::Modern,
            },
        }
    }

    pub fn miner(&self) -> Miner {
        Miner::new(self.max_nonce).with_workers(self.workers)
    }
}

fn parse_setting<T: FromStr>(key: &str, value: &str) -> Result<T> {
    debug!("Config override {key}={value}");
    value
        .trim()
        .parse()
        .map_err(|_| BlockchainError::Config(format!("Invalid value for {key}: {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.mining_reward, 10);
        assert_eq!(config.max_nonce, 1_000_000);
        assert_eq!(config.workers, 1);
        assert_eq!(config.hash_mode, HashMode::Modern);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default()
            .with_overrides(lookup_from(&[
                ("TALLY_DIFFICULTY", "2"),
                ("TALLY_WORKERS", " 3 "),
                ("TALLY_HASH_MODE", "sha1"),
            ]))
            .unwrap();

        assert_eq!(config.difficulty, 2);
        assert_eq!(config.workers, 3);
        assert_eq!(config.hash_mode, HashMode::Legacy);
        assert_eq!(config.ledger_params().mining_reward, 0);
        assert_eq!(config.ledger_params().difficulty, LEGACY_DIFFICULTY);
        assert_eq!(config.miner().get_workers(), 3);
    }

    #[test]
    fn test_bad_overrides() {
        let not_a_number = Config::default().with_overrides(lookup_from(&[("TALLY_MAX_NONCE", "lots")]));
        assert!(matches!(not_a_number, Err(BlockchainError::Config(_))));

        let too_hard = Config::default().with_overrides(lookup_from(&[("TALLY_DIFFICULTY", "9")]));
        assert!(too_hard.is_err());

        let no_workers = Config::default().with_overrides(lookup_from(&[("TALLY_WORKERS", "0")]));
        assert!(no_workers.is_err());
    }

    #[test]
    fn test_toml_partial() {
        let config = Config::from_toml_str("difficulty = 3\nhash_mode = \"legacy\"\n").unwrap();
        assert_eq!(config.difficulty, 3);
        assert_eq!(config.hash_mode, HashMode::Legacy);
        assert_eq!(config.max_nonce, DEFAULT_MAX_NONCE);
    }

    #[test]
    fn test_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.toml");
        std::fs::write(&path, "mining_reward = 25\nworkers = 2\n").unwrap();

        let config = Config::from_toml_file(&path).unwrap();
        assert_eq!(config.mining_reward, 25);
        assert_eq!(config.workers, 2);

        assert!(matches!(
            Config::from_toml_str("difficulty = \"hard\""),
            Err(BlockchainError::Config(_))
        ));
    }
}
