use crate::error::{BlockchainError, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Where the simulator looks for its settings when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";

// Environment variables applied on top of the file
const MINERS_KEY: &str = "VC_MINERS";
const CLIENTS_KEY: &str = "VC_CLIENTS";
const CHAIN_SIZE_KEY: &str = "VC_CHAIN_SIZE";

/// Simulation settings. Read once at startup, never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    pub number_of_miners: u32,
    pub number_of_clients: u32,
    pub assumed_blockchain_size: u32, // Mining stops at this height
    pub initial_clients_delay: u64,   // ms before the first client transaction
    pub clients_transactions_delay: u64, // ms between client transactions
    pub use_full_transactions_check_on_loading: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            number_of_miners: 4,
            number_of_clients: 4,
            assumed_blockchain_size: 10,
            initial_clients_delay: 100,
            clients_transactions_delay: 500,
            use_full_transactions_check_on_loading: false,
        }
    }
}

impl SimulationConfig {
    /// Read settings from `path`. A missing file means defaults; a file that
    /// exists but cannot be parsed is an error. `.toml` files are read as TOML,
    /// everything else as JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<SimulationConfig> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "Configuration file {} not found, using defaults",
                path.display()
            );
            return Ok(SimulationConfig::default());
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content, Self::is_toml(path))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str, toml_format: bool) -> Result<SimulationConfig> {
        if toml_format {
            Ok(toml::from_str(content)?)
        } else {
            serde_json::from_str(content)
                .map_err(|e| BlockchainError::Config(format!("Invalid configuration: {e}")))
        }
    }

    fn is_toml(path: &Path) -> bool {
        path.extension()
            .map(|extension| extension.eq_ignore_ascii_case("toml"))
            .unwrap_or(false)
    }

    /// Apply `VC_MINERS`, `VC_CLIENTS` and `VC_CHAIN_SIZE` if they are set
    pub fn apply_env_overrides(mut self) -> Result<SimulationConfig> {
        if let Some(miners) = Self::env_number(MINERS_KEY)? {
            self.number_of_miners = miners;
        }
        if let Some(clients) = Self::env_number(CLIENTS_KEY)? {
            self.number_of_clients = clients;
        }
        if let Some(size) = Self::env_number(CHAIN_SIZE_KEY)? {
            self.assumed_blockchain_size = size;
        }
        Ok(self)
    }

    fn env_number(key: &str) -> Result<Option<u32>> {
        match env::var(key) {
            Ok(value) => value
                .trim()
                .parse::<u32>()
                .map(Some)
                .map_err(|e| BlockchainError::Config(format!("{key}={value} is not a number: {e}"))),
            Err(_) => Ok(None),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.number_of_miners == 0 {
            return Err(BlockchainError::Config(
                "numberOfMiners must be at least 1".to_string(),
            ));
        }
        if self.assumed_blockchain_size == 0 {
            return Err(BlockchainError::Config(
                "assumedBlockchainSize must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
