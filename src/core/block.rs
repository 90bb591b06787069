use crate::core::digest::{block_hash, transactions_digest};
use crate::core::{MinerReward, SignedTransaction};
use crate::error::Result;
use crate::utils::{deserialize, serialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hash recorded for the genesis block
pub const GENESIS_HASH: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Block {
    height: u32,
    timestamp: i64,
    transactions_digest: String,
    nonce: u64,
    previous_hash: String,
    hash: String,
    miner_name: String,
    miner_reward: Option<MinerReward>, // None only on genesis
    transactions: Vec<SignedTransaction>,
}

impl Block {
    /// Build a block with every field already known. Nothing is recomputed here:
    /// a block carrying a wrong hash or digest is representable and the validator
    /// is what rejects it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        height: u32,
        timestamp: i64,
        transactions_digest: String,
        nonce: u64,
        previous_hash: String,
        hash: String,
        miner_name: String,
        miner_reward: Option<MinerReward>,
        transactions: Vec<SignedTransaction>,
    ) -> Block {
        Block {
            height,
            timestamp,
            transactions_digest,
            nonce,
            previous_hash,
            hash,
            miner_name,
            miner_reward,
            transactions,
        }
    }

    pub fn generate_genesis_block() -> Block {
        Block {
            height: 0,
            timestamp: 0,
            transactions_digest: String::new(),
            nonce: 0,
            previous_hash: String::new(),
            hash: GENESIS_HASH.to_string(),
            miner_name: String::new(),
            miner_reward: None,
            transactions: vec![],
        }
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        deserialize::<Block>(bytes)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self)
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    pub fn get_height(&self) -> u32 {
        self.height
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_transactions_digest(&self) -> &str {
        self.transactions_digest.as_str()
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn get_hash(&self) -> &str {
        self.hash.as_str()
    }

    pub fn get_miner_name(&self) -> &str {
        self.miner_name.as_str()
    }

    pub fn get_miner_reward(&self) -> Option<&MinerReward> {
        self.miner_reward.as_ref()
    }

    pub fn get_transactions(&self) -> &[SignedTransaction] {
        self.transactions.as_slice()
    }

    /// Digest of the transactions actually carried, regardless of the stored one
    pub fn hash_transactions(&self) -> String {
        transactions_digest(&self.transactions)
    }

    /// Block hash recomputed from this block's own fields
    pub fn calculate_hash(&self) -> String {
        block_hash(
            self.miner_reward.as_ref(),
            self.height,
            self.timestamp,
            self.nonce,
            &self.previous_hash,
            &self.transactions_digest,
        )
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block:")?;
        writeln!(f, "Created by miner # {}", self.miner_name)?;
        if let Some(reward) = &self.miner_reward {
            writeln!(f, "{reward}")?;
        }
        writeln!(f, "Id: {}", self.height)?;
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        writeln!(f, "Transactions hash:")?;
        writeln!(f, "{}", self.transactions_digest)?;
        writeln!(f, "Magic number: {}", self.nonce)?;
        writeln!(f, "Hash of the previous block:")?;
        writeln!(f, "{}", self.previous_hash)?;
        writeln!(f, "Hash of the block:")?;
        writeln!(f, "{}", self.hash)?;
        write!(f, "Block data:")?;
        if self.transactions.is_empty() {
            write!(f, " no transactions")
        } else {
            for transaction in &self.transactions {
                write!(f, "\n{transaction}")?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;

    #[test]
    fn test_genesis_block() {
        let genesis = Block::generate_genesis_block();
        assert_eq!(genesis.get_height(), 0);
        assert_eq!(genesis.get_hash(), GENESIS_HASH);
        assert!(genesis.get_miner_reward().is_none());
        assert!(genesis.get_transactions().is_empty());
        assert!(genesis.is_genesis());
    }

    #[test]
    fn test_calculate_hash_matches_digest_rules() {
        let tx = SignedTransaction::new(Transaction::new("FC", "SC", 30), 5, vec![1], vec![1]);
        let reward = MinerReward::new("FC", 100);
        let digest = transactions_digest(std::slice::from_ref(&tx));
        let hash = block_hash(Some(&reward), 1, 10, 7, GENESIS_HASH, &digest);
        let block = Block::new(
            1,
            10,
            digest,
            7,
            GENESIS_HASH.to_string(),
            hash.clone(),
            "0".to_string(),
            Some(reward),
            vec![tx],
        );

        assert_eq!(block.calculate_hash(), hash);
        assert_eq!(block.hash_transactions(), block.get_transactions_digest());
    }

    #[test]
    fn test_block_serialization_round_trip() {
        let tx = SignedTransaction::new(Transaction::new("FC", "SC", 30), 5, vec![0, 1], vec![2]);
        let block = Block::new(
            1,
            10,
            "digest".to_string(),
            7,
            GENESIS_HASH.to_string(),
            "hash".to_string(),
            "miner".to_string(),
            Some(MinerReward::new("FC", 100)),
            vec![tx],
        );
        let restored = Block::deserialize(&block.serialize().unwrap()).unwrap();
        assert_eq!(block, restored);
    }

    #[test]
    fn test_display_lists_transactions() {
        let genesis = Block::generate_genesis_block();
        assert!(genesis.to_string().ends_with("Block data: no transactions"));

        let tx = SignedTransaction::new(Transaction::new("FC", "SC", 30), 5, vec![1], vec![1]);
        let block = Block::new(
            1,
            10,
            String::new(),
            0,
            String::new(),
            String::new(),
            "2".to_string(),
            Some(MinerReward::new("FC", 100)),
            vec![tx],
        );
        let rendered = block.to_string();
        assert!(rendered.contains("Created by miner # 2"));
        assert!(rendered.contains("FC gets 100 VC"));
        assert!(rendered.ends_with("FC sent 30 VC to SC"));
    }
}
