// Saving and restoring simulation progress. Everything lives in one Sled database
// under the data directory, one tree per kind of record, so a run can pick up where
// the previous one stopped.

use crate::core::{Block, SignedTransaction};
use crate::error::{BlockchainError, Result};
use crate::storage::export::export_chain_json;
use crate::utils::{deserialize, serialize};
use crate::wallet::{Wallet, Wallets};
use log::info;
use sled::{Batch, Db, Tree};
use std::env::current_dir;
use std::fs;
use std::path::{Path, PathBuf};

// Tree names inside the database
const BLOCKS_TREE: &str = "blocks"; // big-endian height -> Block
const PENDING_TREE: &str = "pending"; // big-endian insertion index -> SignedTransaction
const WALLETS_TREE: &str = "wallets"; // participant name -> Wallet

/// Directory used when none is given
pub const DEFAULT_DATA_DIR: &str = "serialization_output";
/// Name of the JSON export written next to the database
pub const EXPORT_FILE: &str = "blockchain.json";

pub struct Storage {
    db: Db,
    path: PathBuf,
}

impl Storage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Storage> {
        let path = path.as_ref().to_path_buf();
        let db = sled::open(&path)
            .map_err(|e| BlockchainError::Database(format!("Failed to open database: {e}")))?;
        Ok(Storage { db, path })
    }

    /// `./serialization_output` under the working directory
    pub fn default_path() -> Result<PathBuf> {
        Ok(current_dir()?.join(DEFAULT_DATA_DIR))
    }

    pub fn get_path(&self) -> &Path {
        self.path.as_path()
    }

    fn open_tree(&self, name: &str) -> Result<Tree> {
        self.db
            .open_tree(name)
            .map_err(|e| BlockchainError::Database(format!("Failed to open {name} tree: {e}")))
    }

    // Swap the whole tree content for `entries` in one atomic batch
    fn replace_tree(&self, name: &str, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()> {
        let tree = self.open_tree(name)?;
        let mut batch = Batch::default();
        for key in tree.iter().keys() {
            let key = key.map_err(|e| {
                BlockchainError::Database(format!("Failed to iterate {name} tree: {e}"))
            })?;
            batch.remove(key);
        }
        for (key, value) in entries {
            batch.insert(key, value);
        }
        tree.apply_batch(batch)
            .map_err(|e| BlockchainError::Database(format!("Failed to update {name} tree: {e}")))?;
        Ok(())
    }

    fn read_values(&self, name: &str) -> Result<Vec<sled::IVec>> {
        let tree = self.open_tree(name)?;
        let mut values = vec![];
        for item in tree.iter().values() {
            values.push(item.map_err(|e| {
                BlockchainError::Database(format!("Failed to iterate {name} tree: {e}"))
            })?);
        }
        Ok(values)
    }

    pub fn save_chain(&self, blocks: &[Block]) -> Result<()> {
        let mut entries = Vec::with_capacity(blocks.len());
        for block in blocks {
            entries.push((block.get_height().to_be_bytes().to_vec(), block.serialize()?));
        }
        self.replace_tree(BLOCKS_TREE, entries)?;
        info!("Saved {} blocks to {}", blocks.len(), self.path.display());
        Ok(())
    }

    /// Stored chain in height order, `None` when nothing was saved yet
    pub fn load_chain(&self) -> Result<Option<Vec<Block>>> {
        let values = self.read_values(BLOCKS_TREE)?;
        if values.is_empty() {
            return Ok(None);
        }
        let mut blocks = Vec::with_capacity(values.len());
        for value in values {
            blocks.push(Block::deserialize(&value)?);
        }
        Ok(Some(blocks))
    }

    pub fn save_pool(&self, transactions: &[SignedTransaction]) -> Result<()> {
        let mut entries = Vec::with_capacity(transactions.len());
        for (index, tx) in transactions.iter().enumerate() {
            entries.push(((index as u64).to_be_bytes().to_vec(), serialize(tx)?));
        }
        self.replace_tree(PENDING_TREE, entries)
    }

    /// Stored pending transactions in their original order
    pub fn load_pool(&self) -> Result<Vec<SignedTransaction>> {
        let mut transactions = vec![];
        for value in self.read_values(PENDING_TREE)? {
            transactions.push(deserialize::<SignedTransaction>(&value)?);
        }
        Ok(transactions)
    }

    pub fn save_wallets(&self, wallets: &Wallets) -> Result<()> {
        let mut entries = Vec::with_capacity(wallets.len());
        for (name, wallet) in wallets.iter() {
            entries.push((name.as_bytes().to_vec(), serialize(wallet)?));
        }
        self.replace_tree(WALLETS_TREE, entries)
    }

    pub fn load_wallets(&self) -> Result<Wallets> {
        let tree = self.open_tree(WALLETS_TREE)?;
        let mut entries = vec![];
        for item in tree.iter() {
            let (key, value) = item.map_err(|e| {
                BlockchainError::Database(format!("Failed to iterate wallets tree: {e}"))
            })?;
            let name = String::from_utf8(key.to_vec())
                .map_err(|e| BlockchainError::Database(format!("Invalid wallet name: {e}")))?;
            entries.push((name, deserialize::<Wallet>(&value)?));
        }
        Ok(Wallets::from_entries(entries))
    }

    /// Write the JSON export of `blocks` next to the database and return its path
    pub fn write_export(&self, blocks: &[Block]) -> Result<PathBuf> {
        let json = export_chain_json(blocks)?;
        fs::create_dir_all(&self.path)?;
        let export_path = self.path.join(EXPORT_FILE);
        fs::write(&export_path, json)?;
        Ok(export_path)
    }

    pub fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| BlockchainError::Database(format!("Failed to flush database: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::{balance_fixture_chain, balance_fixture_pool, create_temp_storage};

    #[test]
    fn test_empty_storage_has_no_chain() {
        let (storage, _dir) = create_temp_storage().unwrap();
        assert!(storage.load_chain().unwrap().is_none());
        assert!(storage.load_pool().unwrap().is_empty());
        assert!(storage.load_wallets().unwrap().is_empty());
    }

    #[test]
    fn test_chain_and_pool_round_trip() {
        let (storage, _dir) = create_temp_storage().unwrap();
        let chain = balance_fixture_chain();
        let pool = balance_fixture_pool();

        storage.save_chain(&chain).unwrap();
        storage.save_pool(&pool).unwrap();

        assert_eq!(storage.load_chain().unwrap(), Some(chain));
        assert_eq!(storage.load_pool().unwrap(), pool);
    }

    #[test]
    fn test_saving_replaces_previous_content() {
        let (storage, _dir) = create_temp_storage().unwrap();
        let chain = balance_fixture_chain();
        storage.save_chain(&chain).unwrap();
        storage.save_chain(&chain[..1]).unwrap();
        assert_eq!(storage.load_chain().unwrap().unwrap().len(), 1);

        storage.save_pool(&balance_fixture_pool()).unwrap();
        storage.save_pool(&[]).unwrap();
        assert!(storage.load_pool().unwrap().is_empty());
    }

    #[test]
    fn test_wallets_round_trip() {
        let (storage, _dir) = create_temp_storage().unwrap();
        let mut wallets = Wallets::new();
        let address = wallets.create_wallet("Miner 0").unwrap();
        storage.save_wallets(&wallets).unwrap();

        let restored = storage.load_wallets().unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.get_wallet("Miner 0").unwrap().get_address(), address);
    }

    #[test]
    fn test_write_export() {
        let (storage, _dir) = create_temp_storage().unwrap();
        let path = storage.write_export(&balance_fixture_chain()).unwrap();
        let json = fs::read_to_string(path).unwrap();
        assert!(json.contains("\"TransactionsHash\""));
    }
}
