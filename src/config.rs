use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Runtime configuration, loaded from environment variables with defaults
/// suitable for local use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Path of the whole-ledger JSON snapshot.
    pub data_path: PathBuf,
    /// Required number of leading zero hex digits in every block hash.
    pub difficulty: usize,
    /// Maximum nonce attempts before a mutation fails as retryable.
    pub mining_budget: u64,
}

impl LedgerConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let data_path = env::var("LEDGER_DATA_PATH")
            .unwrap_or_else(|_| "data/ledger.json".to_string())
            .into();

        let difficulty = env::var("LEDGER_DIFFICULTY")
            .unwrap_or_else(|_| "4".to_string())
            .parse()?;

        let mining_budget = env::var("LEDGER_MINING_BUDGET")
            .unwrap_or_else(|_| "10000000".to_string())
            .parse()?;

        Ok(LedgerConfig {
            data_path,
            difficulty,
            mining_budget,
        })
    }
}
