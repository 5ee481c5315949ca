//! Runtime configuration, loaded from TOML
//!
//! Every field has a default, so an empty file (or no file) yields the
//! standard local chain: ten accounts holding 1000 ether each, and a lottery
//! that requires more than 0.01 ether to enter.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::Amount;
use crate::{Error, Result};

/// Entry threshold used when none is configured (0.01 ether)
pub const DEFAULT_MINIMUM_STAKE: Amount = Amount::from_wei(10_000_000_000_000_000);

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lottery: LotteryConfig,
    pub ledger: LedgerConfig,
}

/// Contract parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    /// Stakes must be strictly greater than this
    pub minimum_stake: Amount,
}

/// In-memory chain parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Number of funded accounts
    pub accounts: usize,
    /// Starting balance of every account
    pub initial_balance: Amount,
    /// Account addresses are derived from this phrase
    pub seed_phrase: String,
    /// Seed for winner selection; `None` draws fresh entropy
    pub rng_seed: Option<u64>,
    /// Index of the account that deploys the contract
    pub deployer: usize,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            minimum_stake: DEFAULT_MINIMUM_STAKE,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            accounts: 10,
            initial_balance: Amount::ether(1000),
            seed_phrase: "lottery test chain".to_string(),
            rng_seed: None,
            deployer: 0,
        }
    }
}

impl Config {
    /// Read and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Parse and validate TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| Error::Config(e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ledger.accounts == 0 {
            return Err(Error::Config("ledger.accounts must be at least 1".into()));
        }
        if self.ledger.deployer >= self.ledger.accounts {
            return Err(Error::Config(format!(
                "ledger.deployer {} is out of range for {} accounts",
                self.ledger.deployer, self.ledger.accounts
            )));
        }
        Ok(())
    }

    /// Same config with a fixed winner-selection seed
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.ledger.rng_seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.lottery.minimum_stake, "0.01 ether".parse().unwrap());
        assert_eq!(config.ledger.accounts, 10);
        assert_eq!(config.ledger.initial_balance, Amount::ether(1000));
        assert_eq!(config.ledger.rng_seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml(
            r#"
            [lottery]
            minimum_stake = "0.5 ether"

            [ledger]
            accounts = 3
            rng_seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.lottery.minimum_stake, "0.5 ether".parse().unwrap());
        assert_eq!(config.ledger.accounts, 3);
        assert_eq!(config.ledger.rng_seed, Some(7));
        assert_eq!(config.ledger.initial_balance, Amount::ether(1000));
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            Config::from_toml("[ledger]\naccounts = 0"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_toml("[ledger]\naccounts = 2\ndeployer = 2"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_toml("[lottery]\nminimum_stake = \"lots\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/lottery.toml")).unwrap_err();
        assert_eq!(err.kind(), "Config");
    }
}
