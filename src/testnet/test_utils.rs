//! Test utilities for ledger testing

use crate::core::{
    block_hash, meets_difficulty, transactions_digest, Block, Ledger, MinerReward, ProofOfWork,
    SignedTransaction, Transaction, REWARD_VALUE,
};
use crate::error::{BlockchainError, Result};
use crate::storage::Storage;
use crate::utils::current_timestamp;
use crate::wallet::Wallet;
use tempfile::TempDir;

// Signature and public key bytes of transactions that are never verified
const DUMMY_BYTES: [u8; 1] = [1];

/// Create a temporary directory for testing
pub fn create_temp_dir() -> Result<TempDir> {
    tempfile::tempdir().map_err(|e| BlockchainError::Io(e.to_string()))
}

/// Storage in a fresh temporary directory (database under `<dir>/data`)
pub fn create_temp_storage() -> Result<(Storage, TempDir)> {
    let temp_dir = create_temp_dir()?;
    let storage = Storage::open(temp_dir.path().join("data"))?;
    Ok((storage, temp_dir))
}

/// A transaction with placeholder signature and key
pub fn signed_dummy(sender: &str, receiver: &str, amount: u64, timestamp: i64) -> SignedTransaction {
    SignedTransaction::new(
        Transaction::new(sender, receiver, amount),
        timestamp,
        DUMMY_BYTES.to_vec(),
        DUMMY_BYTES.to_vec(),
    )
}

/// Build a correctly hashed block on top of `prev` by scanning nonces from zero.
/// Keep `difficulty` small.
pub fn mine_block_on(
    prev: &Block,
    transactions: Vec<SignedTransaction>,
    miner_reward: Option<MinerReward>,
    difficulty: u32,
    timestamp: i64,
) -> Block {
    let height = prev.get_height() + 1;
    let digest = transactions_digest(&transactions);
    let mut nonce = 0;
    loop {
        let hash = block_hash(
            miner_reward.as_ref(),
            height,
            timestamp,
            nonce,
            prev.get_hash(),
            &digest,
        );
        if meets_difficulty(&hash, difficulty) {
            return Block::new(
                height,
                timestamp,
                digest,
                nonce,
                prev.get_hash().to_string(),
                hash,
                "test".to_string(),
                miner_reward,
                transactions,
            );
        }
        nonce += 1;
    }
}

/// Mine the next block of `ledger` from its current state, rewarding `miner_address`
pub fn mine_next(ledger: &Ledger, miner_address: &str) -> Block {
    let (last, pending, difficulty) = ledger.snapshot();
    let pow = ProofOfWork::new_proof_of_work(
        &last,
        pending,
        "test",
        MinerReward::new(miner_address, REWARD_VALUE),
        difficulty,
    );
    // One millisecond in the past so the block is not "from the future" on append
    pow.run(current_timestamp().unwrap() - 1)
}

/// Genesis, FC mines block 1, SC mines block 2 which carries FC -> SC: 30
pub fn balance_fixture_chain() -> Vec<Block> {
    let genesis = Block::generate_genesis_block();
    let first = mine_block_on(&genesis, vec![], Some(MinerReward::new("FC", 100)), 0, 1);
    let second = mine_block_on(
        &first,
        vec![signed_dummy("FC", "SC", 30, 5)],
        Some(MinerReward::new("SC", 100)),
        0,
        10,
    );
    vec![genesis, first, second]
}

/// Pending FC -> TC: 10 and SC -> TC: 10
pub fn balance_fixture_pool() -> Vec<SignedTransaction> {
    vec![
        signed_dummy("FC", "TC", 10, 10),
        signed_dummy("SC", "TC", 10, 12),
    ]
}

/// A real key pair for tests that need valid signatures
pub struct TestKeys {
    pub address: String,
    pub wallet: Wallet,
}

impl TestKeys {
    pub fn generate() -> TestKeys {
        let wallet = Wallet::new().unwrap();
        TestKeys {
            address: wallet.get_address(),
            wallet,
        }
    }

    pub fn sign(&self, transaction: Transaction, timestamp: i64) -> SignedTransaction {
        self.wallet.sign_transaction(transaction, timestamp).unwrap()
    }

    /// Genesis plus one block rewarding this key
    pub fn chain_with_reward(&self) -> Vec<Block> {
        let genesis = Block::generate_genesis_block();
        let first = mine_block_on(
            &genesis,
            vec![],
            Some(MinerReward::new(&self.address, REWARD_VALUE)),
            0,
            1_000,
        );
        vec![genesis, first]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_chain_links() {
        let chain = balance_fixture_chain();
        assert_eq!(chain[1].get_previous_hash(), chain[0].get_hash());
        assert_eq!(chain[2].get_previous_hash(), chain[1].get_hash());
        assert_eq!(chain[2].calculate_hash(), chain[2].get_hash());
    }

    #[test]
    fn test_create_temp_storage() {
        let (storage, dir) = create_temp_storage().unwrap();
        assert!(storage.get_path().starts_with(dir.path()));
    }
}
