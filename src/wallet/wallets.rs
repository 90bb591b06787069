use crate::error::{BlockchainError, Result};
use crate::wallet::Wallet;
use std::collections::BTreeMap;

/// Wallets of the simulation participants, keyed by participant name
/// ("Miner 0", "Client 3", ...). Persisted through `storage::Storage`.
#[derive(Default)]
pub struct Wallets {
    wallets: BTreeMap<String, Wallet>,
}

impl Wallets {
    pub fn new() -> Wallets {
        Wallets {
            wallets: BTreeMap::new(),
        }
    }

    pub fn from_entries(entries: Vec<(String, Wallet)>) -> Wallets {
        Wallets {
            wallets: entries.into_iter().collect(),
        }
    }

    /// Create a new wallet under `name` and return its address. Names are unique.
    pub fn create_wallet(&mut self, name: &str) -> Result<String> {
        if self.wallets.contains_key(name) {
            return Err(BlockchainError::Wallet(format!(
                "A wallet named '{name}' already exists"
            )));
        }
        let wallet = Wallet::new()?;
        let address = wallet.get_address();
        self.wallets.insert(name.to_string(), wallet);
        Ok(address)
    }

    /// The wallet stored under `name`, created on first use
    pub fn get_or_create(&mut self, name: &str) -> Result<Wallet> {
        if let Some(wallet) = self.wallets.get(name) {
            return Ok(wallet.clone());
        }
        let wallet = Wallet::new()?;
        self.wallets.insert(name.to_string(), wallet.clone());
        Ok(wallet)
    }

    pub fn get_wallet(&self, name: &str) -> Option<&Wallet> {
        self.wallets.get(name)
    }

    /// `(name, address)` pairs in name order
    pub fn get_addresses(&self) -> Vec<(String, String)> {
        self.wallets
            .iter()
            .map(|(name, wallet)| (name.clone(), wallet.get_address()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Wallet)> {
        self.wallets.iter()
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}
