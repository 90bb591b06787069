use crate::core::digest::{block_hash, meets_difficulty, transactions_digest};
use crate::core::{Block, MinerReward, SignedTransaction};
use log::debug;
use rand::Rng;

// How many attempts go by between two checks of the stop condition
const STOP_CHECK_INTERVAL: u64 = 4096;

/// A candidate block with everything fixed except nonce and hash.
///
/// All inputs are captured up front from snapshots, so the search itself touches
/// no shared state and many workers can run it in parallel.
pub struct ProofOfWork {
    height: u32,
    previous_hash: String,
    miner_name: String,
    miner_reward: MinerReward,
    transactions: Vec<SignedTransaction>,
    transactions_digest: String,
    difficulty: u32,
}

impl ProofOfWork {
    pub fn new_proof_of_work(
        prev_block: &Block,
        transactions: Vec<SignedTransaction>,
        miner_name: &str,
        miner_reward: MinerReward,
        difficulty: u32,
    ) -> ProofOfWork {
        ProofOfWork {
            height: prev_block.get_height() + 1,
            previous_hash: prev_block.get_hash().to_string(),
            miner_name: miner_name.to_string(),
            miner_reward,
            transactions_digest: transactions_digest(&transactions),
            transactions,
            difficulty,
        }
    }

    pub fn get_height(&self) -> u32 {
        self.height
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Whether a block's stored hash both meets `difficulty` and matches its contents
    pub fn validate(block: &Block, difficulty: u32) -> bool {
        meets_difficulty(block.get_hash(), difficulty) && block.calculate_hash() == block.get_hash()
    }

    // Nonces are drawn from [0, 10^(difficulty + 4))
    fn nonce_bound(&self) -> u64 {
        10u64.saturating_pow(self.difficulty + 4)
    }

    fn hash_with(&self, timestamp: i64, nonce: u64) -> String {
        block_hash(
            Some(&self.miner_reward),
            self.height,
            timestamp,
            nonce,
            &self.previous_hash,
            &self.transactions_digest,
        )
    }

    /// Search until a nonce satisfies the difficulty. `timestamp` stays the same
    /// for every attempt.
    pub fn run(&self, timestamp: i64) -> Block {
        loop {
            if let Some(block) = self.run_until(timestamp, || false) {
                return block;
            }
        }
    }

    /// Like `run`, but gives up and returns `None` once `should_stop` says so.
    /// The condition is polled every few thousand attempts.
    pub fn run_until<F>(&self, timestamp: i64, should_stop: F) -> Option<Block>
    where
        F: Fn() -> bool,
    {
        let mut rng = rand::thread_rng();
        let bound = self.nonce_bound();
        let mut attempts: u64 = 0;

        loop {
            if attempts % STOP_CHECK_INTERVAL == 0 && should_stop() {
                debug!("Search for block {} interrupted after {attempts} attempts", self.height);
                return None;
            }
            attempts += 1;

            let nonce = rng.gen_range(0..bound);
            let hash = self.hash_with(timestamp, nonce);
            if meets_difficulty(&hash, self.difficulty) {
                debug!("Found hash {hash} for block {} after {attempts} attempts", self.height);
                return Some(Block::new(
                    self.height,
                    timestamp,
                    self.transactions_digest.clone(),
                    nonce,
                    self.previous_hash.clone(),
                    hash,
                    self.miner_name.clone(),
                    Some(self.miner_reward.clone()),
                    self.transactions.clone(),
                ));
            }
        }
    }
}
