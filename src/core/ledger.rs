// The ledger is the one place where the chain grows. Miners and wallets only ever
// hold a shared handle to it; every append goes through a single write lock so the
// height checks always see a consistent chain.

use crate::core::{
    Block, BlockRejection, DifficultyController, SignedTransaction, TransactionRejection,
    Validator,
};
use crate::error::Result;
use crate::storage::TransactionPool;
use crate::utils::current_timestamp;
use log::{debug, info, warn};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Coins minted to the miner of every accepted block
pub const REWARD_VALUE: u64 = 100;

pub struct Ledger {
    chain: RwLock<Vec<Block>>, // Genesis first, never empty
    pool: TransactionPool,
    difficulty: DifficultyController,
    initial_difficulty: u32, // Where difficulty replays start from
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    // A fresh ledger holds only the genesis block
    pub fn new() -> Ledger {
        Self::with_difficulty(DifficultyController::get_initial_difficulty())
    }

    /// Start from a specific difficulty instead of the default. Mostly useful to
    /// keep proof-of-work cheap in tests.
    ///
    /// Only the live chain and strict verification in `load` start from this value.
    /// A chain accepted by `load` gets its difficulty replayed from the default
    /// initial difficulty, so a resumed ledger can mine harder than it started.
    pub fn with_difficulty(difficulty: u32) -> Ledger {
        let difficulty = DifficultyController::with_difficulty(difficulty);
        let initial_difficulty = difficulty.get_difficulty();
        Ledger {
            chain: RwLock::new(vec![Block::generate_genesis_block()]),
            pool: TransactionPool::new(),
            difficulty,
            initial_difficulty,
        }
    }

    // I recover the guard on poison: the chain is only ever pushed to as a whole
    // block, so a panicking holder cannot leave it half-written
    fn read_chain(&self) -> RwLockReadGuard<'_, Vec<Block>> {
        self.chain.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_chain(&self) -> RwLockWriteGuard<'_, Vec<Block>> {
        self.chain.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Validate and commit a candidate. On success the included transactions leave
    /// the pool and the difficulty is re-evaluated, all before the lock is released.
    pub fn try_append(&self, candidate: Block) -> std::result::Result<(), BlockRejection> {
        let mut chain = self.write_chain();

        let expected = chain.len() as u32;
        if candidate.get_height() != expected {
            return Err(BlockRejection::WrongHeight {
                expected,
                actual: candidate.get_height(),
            });
        }

        // The wall clock only fails if the system time is before 1970; treat the
        // block as not yet valid then
        let now = current_timestamp().unwrap_or(i64::MIN);
        let prev_block = match chain.last() {
            Some(block) => block,
            None => return Err(BlockRejection::PreviousHashMismatch),
        };
        Validator::inspect_block_base(
            &candidate,
            prev_block,
            self.difficulty.get_difficulty(),
            now,
        )?;
        if !Validator::check_block_reward(&candidate) {
            return Err(BlockRejection::InvalidReward);
        }

        // Checked against the live pool, not whatever the miner saw
        let known = self
            .pool
            .with_snapshot(|pool| Validator::check_block_transactions(&candidate, pool))
            .unwrap_or(false);
        if !known {
            return Err(BlockRejection::UnknownTransactions);
        }

        self.pool.remove_included(&candidate);
        info!("{candidate}");
        chain.push(candidate);
        self.difficulty.adjust(&chain);
        Ok(())
    }

    /// Same as `try_append`, reduced to whether the block went in
    pub fn append(&self, candidate: Block) -> bool {
        let height = candidate.get_height();
        match self.try_append(candidate) {
            Ok(()) => true,
            Err(rejection) => {
                debug!("Block {height} rejected: {rejection}");
                false
            }
        }
    }

    pub fn last(&self) -> Block {
        let chain = self.read_chain();
        match chain.last() {
            Some(block) => block.clone(),
            None => Block::generate_genesis_block(),
        }
    }

    /// Number of blocks on top of genesis
    pub fn size(&self) -> u32 {
        self.read_chain().len().saturating_sub(1) as u32
    }

    pub fn current_difficulty(&self) -> u32 {
        self.difficulty.get_difficulty()
    }

    pub fn get_initial_difficulty(&self) -> u32 {
        self.initial_difficulty
    }

    /// Copy of the whole chain, genesis first
    pub fn blocks(&self) -> Vec<Block> {
        self.read_chain().clone()
    }

    /// Replace the chain wholesale and recompute the difficulty from its history.
    ///
    /// With `strict` set the chain is fully re-verified first and rejected if any
    /// rule fails. Returns whether `blocks` was taken; otherwise the ledger is reset
    /// to genesis with an empty pool.
    pub fn load(&self, blocks: Vec<Block>, strict: bool) -> bool {
        let accepted = if blocks.is_empty() {
            warn!("Loaded chain is empty, starting from genesis");
            false
        } else if strict && !Validator::verify_chain(&blocks, self.initial_difficulty) {
            warn!("Loaded chain failed verification, starting from genesis");
            false
        } else {
            true
        };

        let mut chain = self.write_chain();
        *chain = if accepted {
            blocks
        } else {
            vec![Block::generate_genesis_block()]
        };
        if accepted {
            self.difficulty.recalculate_from_history(&chain);
        } else {
            // Pending spends are only covered by the chain they were made on
            self.pool.clear();
            self.difficulty.reset(self.initial_difficulty);
        }
        info!("Ledger holds {} blocks after loading", chain.len() - 1);
        accepted
    }

    /// Put previously saved pending transactions back without re-validating them
    pub fn load_pool(&self, transactions: Vec<SignedTransaction>) {
        let _chain = self.write_chain();
        self.pool.replace_all(transactions);
    }

    /// Validate a transaction against the current chain and pool and queue it
    pub fn try_add_transaction(
        &self,
        signed_tx: SignedTransaction,
    ) -> std::result::Result<(), TransactionRejection> {
        // Holding the chain lock keeps an append from moving transactions out of the
        // pool while this one is being checked against both
        let chain = self.read_chain();
        self.pool.try_add(signed_tx, &chain)
    }

    pub fn add_transaction(&self, signed_tx: SignedTransaction) -> bool {
        let chain = self.read_chain();
        self.pool.add(signed_tx, &chain)
    }

    /// Balance of `address` over the chain and the pending pool
    pub fn coins_of(&self, address: &str) -> Result<i64> {
        let chain = self.read_chain();
        let pool = self.pool.snapshot();
        Validator::coins_of(address, &chain, &pool)
    }

    pub fn pending_transactions(&self) -> Vec<SignedTransaction> {
        self.pool.snapshot()
    }

    /// Consistent copy of chain and pool taken under one lock, for building a candidate
    pub fn snapshot(&self) -> (Block, Vec<SignedTransaction>, u32) {
        let chain = self.read_chain();
        let last = match chain.last() {
            Some(block) => block.clone(),
            None => Block::generate_genesis_block(),
        };
        (last, self.pool.snapshot(), self.difficulty.get_difficulty())
    }
}
