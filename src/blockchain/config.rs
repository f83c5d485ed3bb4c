use serde::{Deserialize, Serialize};

use super::block::DEFAULT_MAX_ATTEMPTS;
use super::validator::LeadingZeroBytes;

/// Environment variable overriding `MiningConfig::max_attempts`
pub const ENV_MAX_ATTEMPTS: &str = "LEDGER_MAX_ATTEMPTS";

/// Environment variable overriding `MiningConfig::difficulty`
pub const ENV_DIFFICULTY: &str = "LEDGER_DIFFICULTY";

/// Width in bytes of every block hash
pub const DIGEST_LEN: usize = 32;

/// Proof-of-work settings for a ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Upper bound on nonces tried before mining gives up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u64,

    /// Leading zero bytes required by the standard validator
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
}

fn default_max_attempts() -> u64 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_difficulty() -> usize {
    1
}

impl Default for MiningConfig {
    fn default() -> Self {
        MiningConfig {
            max_attempts: default_max_attempts(),
            difficulty: default_difficulty(),
        }
    }
}

impl MiningConfig {
    /// Parses a config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: MiningConfig = serde_json::from_str(json).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Builds a config from the defaults overridden by `LEDGER_*` variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = MiningConfig::default();

        if let Some(raw) = lookup(ENV_MAX_ATTEMPTS) {
            config.max_attempts = raw
                .trim()
                .parse()
                .map_err(|e| format!("{}={:?}: {}", ENV_MAX_ATTEMPTS, raw, e))?;
        }

        if let Some(raw) = lookup(ENV_DIFFICULTY) {
            config.difficulty = raw
                .trim()
                .parse()
                .map_err(|e| format!("{}={:?}: {}", ENV_DIFFICULTY, raw, e))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings under which no block could ever be mined
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.difficulty > DIGEST_LEN {
            return Err(format!(
                "difficulty {} exceeds the {}-byte digest",
                self.difficulty, DIGEST_LEN
            ));
        }
        Ok(())
    }

    /// The standard validator for this difficulty
    pub fn validator(&self) -> LeadingZeroBytes {
        LeadingZeroBytes(self.difficulty)
    }
}
