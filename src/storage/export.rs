//! JSON export of the chain
//!
//! Field names are fixed because other tools read these files. Signatures and
//! public keys are written as lowercase hex.

use crate::core::{Block, MinerReward, SignedTransaction, Transaction};
use crate::error::Result;
use crate::utils::{hex_decode, hex_encode};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct BlockRecord {
    #[serde(rename = "Id")]
    id: u32,
    #[serde(rename = "Timestamp")]
    timestamp: i64,
    #[serde(rename = "TransactionsHash")]
    transactions_hash: String,
    nonce: u64,
    #[serde(rename = "prevHash")]
    prev_hash: String,
    #[serde(rename = "blockHash")]
    block_hash: String,
    #[serde(rename = "minerName")]
    miner_name: String,
    #[serde(rename = "MinerReward")]
    miner_reward: Option<RewardRecord>,
    #[serde(rename = "Transactions")]
    transactions: Vec<TransactionRecord>,
}

#[derive(Serialize, Deserialize)]
struct RewardRecord {
    miner: String,
    reward: u64,
}

#[derive(Serialize, Deserialize)]
struct TransactionRecord {
    sender: String,
    receiver: String,
    amount: u64,
    #[serde(rename = "Timestamp")]
    timestamp: i64,
    #[serde(rename = "Signature")]
    signature: String,
    #[serde(rename = "PublicKey")]
    public_key: String,
}

impl From<&SignedTransaction> for TransactionRecord {
    fn from(tx: &SignedTransaction) -> Self {
        TransactionRecord {
            sender: tx.get_sender().to_string(),
            receiver: tx.get_receiver().to_string(),
            amount: tx.get_amount(),
            timestamp: tx.get_timestamp(),
            signature: hex_encode(tx.get_signature()),
            public_key: hex_encode(tx.get_public_key()),
        }
    }
}

impl From<&Block> for BlockRecord {
    fn from(block: &Block) -> Self {
        BlockRecord {
            id: block.get_height(),
            timestamp: block.get_timestamp(),
            transactions_hash: block.get_transactions_digest().to_string(),
            nonce: block.get_nonce(),
            prev_hash: block.get_previous_hash().to_string(),
            block_hash: block.get_hash().to_string(),
            miner_name: block.get_miner_name().to_string(),
            miner_reward: block.get_miner_reward().map(|reward| RewardRecord {
                miner: reward.get_miner().to_string(),
                reward: reward.get_amount(),
            }),
            transactions: block
                .get_transactions()
                .iter()
                .map(TransactionRecord::from)
                .collect(),
        }
    }
}

impl TransactionRecord {
    fn into_signed_transaction(self) -> Result<SignedTransaction> {
        Ok(SignedTransaction::new(
            Transaction::new(&self.sender, &self.receiver, self.amount),
            self.timestamp,
            hex_decode(&self.signature)?,
            hex_decode(&self.public_key)?,
        ))
    }
}

impl BlockRecord {
    fn into_block(self) -> Result<Block> {
        let transactions = self
            .transactions
            .into_iter()
            .map(TransactionRecord::into_signed_transaction)
            .collect::<Result<Vec<SignedTransaction>>>()?;
        Ok(Block::new(
            self.id,
            self.timestamp,
            self.transactions_hash,
            self.nonce,
            self.prev_hash,
            self.block_hash,
            self.miner_name,
            self.miner_reward
                .map(|reward| MinerReward::new(&reward.miner, reward.reward)),
            transactions,
        ))
    }
}

/// Pretty-printed JSON array of `blocks`
pub fn export_chain_json(blocks: &[Block]) -> Result<String> {
    let records: Vec<BlockRecord> = blocks.iter().map(BlockRecord::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Parse an export back into blocks. Nothing is validated here.
pub fn import_chain_json(json: &str) -> Result<Vec<Block>> {
    let records: Vec<BlockRecord> = serde_json::from_str(json)?;
    records.into_iter().map(BlockRecord::into_block).collect()
}
