//! Block and transaction acceptance rules
//!
//! Everything in here is a pure function of the snapshots it is handed: the
//! chain (genesis first) and the pending pool. Nothing reads shared state, so
//! the same rules serve live appends, pool admission and bulk verification of
//! a loaded chain.

use crate::core::digest::meets_difficulty;
use crate::core::{
    Block, DifficultyController, MinerReward, SignedTransaction, COIN_UNIT, REWARD_VALUE,
};
use crate::error::{BlockchainError, Result};
use crate::utils::{current_timestamp, ecdsa_p256_sha256_sign_verify};
use log::warn;
use std::collections::HashMap;
use std::fmt;

/// Running balance (or outgoing total) per address
pub type BalanceMap = HashMap<String, i64>;

/// Why a transaction was turned away. Routine, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionRejection {
    InvalidSignature,
    StaleTimestamp { timestamp: i64, latest: i64 },
    NonPositiveAmount,
    InsufficientFunds { required: u64, available: i64 },
    Duplicate,
    PoolUnavailable,
}

impl fmt::Display for TransactionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionRejection::InvalidSignature => write!(f, "wrong signature"),
            TransactionRejection::StaleTimestamp { timestamp, latest } => write!(
                f,
                "wrong time: {timestamp} is older than the sender's last transaction at {latest}"
            ),
            TransactionRejection::NonPositiveAmount => write!(f, "transaction value must be positive"),
            TransactionRejection::InsufficientFunds {
                required,
                available,
            } => write!(f, "bad balance: required {required}, available {available}"),
            TransactionRejection::Duplicate => write!(f, "transaction already known"),
            TransactionRejection::PoolUnavailable => write!(f, "transaction pool is unavailable"),
        }
    }
}

/// Why a candidate block was not appended. Losing a race for a height shows up
/// as `WrongHeight` or `PreviousHashMismatch`; there is no separate conflict case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRejection {
    WrongHeight { expected: u32, actual: u32 },
    FutureTimestamp { timestamp: i64, now: i64 },
    PreviousHashMismatch,
    InsufficientWork { difficulty: u32 },
    DigestMismatch,
    HashMismatch,
    UnknownTransactions,
    InvalidReward,
}

impl fmt::Display for BlockRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockRejection::WrongHeight { expected, actual } => {
                write!(f, "wrong height: expected {expected}, got {actual}")
            }
            BlockRejection::FutureTimestamp { timestamp, now } => {
                write!(f, "timestamp {timestamp} is not before current time {now}")
            }
            BlockRejection::PreviousHashMismatch => write!(f, "previous hash does not match"),
            BlockRejection::InsufficientWork { difficulty } => {
                write!(f, "hash does not start with {difficulty} zeros")
            }
            BlockRejection::DigestMismatch => write!(f, "transactions hash does not match"),
            BlockRejection::HashMismatch => write!(f, "block hash does not match its contents"),
            BlockRejection::UnknownTransactions => {
                write!(f, "block contains transactions that are not pending")
            }
            BlockRejection::InvalidReward => {
                write!(f, "block must mint exactly {REWARD_VALUE} {COIN_UNIT}")
            }
        }
    }
}

/// Stateless rule set; every method takes the snapshots it needs.
pub struct Validator;

impl Validator {
    /// Recompute the signing string and check it against the embedded public key.
    /// Malformed keys or signatures simply fail.
    pub fn verify_signature(signed_tx: &SignedTransaction) -> bool {
        let input = signed_tx.string_for_hashing();
        ecdsa_p256_sha256_sign_verify(
            signed_tx.get_public_key(),
            signed_tx.get_signature(),
            input.as_bytes(),
        )
    }

    /// Timestamp of the sender's latest transaction: the last one in the pool if
    /// any, otherwise the last one in the chain (genesis skipped), otherwise zero.
    pub fn latest_transaction_time(
        sender: &str,
        chain: &[Block],
        pool: &[SignedTransaction],
    ) -> i64 {
        pool.iter()
            .filter(|tx| tx.get_sender() == sender)
            .last()
            .or_else(|| {
                chain
                    .iter()
                    .skip(1)
                    .flat_map(|block| block.get_transactions())
                    .filter(|tx| tx.get_sender() == sender)
                    .last()
            })
            .map(|tx| tx.get_timestamp())
            .unwrap_or(0)
    }

    /// A transaction may not be older than its sender's latest one. Stops a stale
    /// signed transaction from being replayed.
    pub fn check_transaction_time(
        signed_tx: &SignedTransaction,
        chain: &[Block],
        pool: &[SignedTransaction],
    ) -> bool {
        let latest = Self::latest_transaction_time(signed_tx.get_sender(), chain, pool);
        signed_tx.get_timestamp() >= latest
    }

    /// Balance without the negativity check: received + mined - spent (chain and pool).
    /// Incoming pending transactions do not count until they are mined.
    pub fn raw_balance(address: &str, chain: &[Block], pool: &[SignedTransaction]) -> i64 {
        let mut received: i64 = 0;
        let mut spent: i64 = 0;
        let mut mined: i64 = 0;

        for block in chain.iter().skip(1) {
            if let Some(reward) = block.get_miner_reward() {
                if reward.get_miner() == address {
                    mined = mined.saturating_add(to_signed(reward.get_amount()));
                }
            }
            for tx in block.get_transactions() {
                if tx.get_receiver() == address {
                    received = received.saturating_add(to_signed(tx.get_amount()));
                }
                if tx.get_sender() == address {
                    spent = spent.saturating_add(to_signed(tx.get_amount()));
                }
            }
        }
        for tx in pool.iter().filter(|tx| tx.get_sender() == address) {
            spent = spent.saturating_add(to_signed(tx.get_amount()));
        }

        received.saturating_add(mined).saturating_sub(spent)
    }

    /// Derived balance of `address`. A negative result means the ledger admitted
    /// an overspend somewhere, which is reported as a fatal error.
    pub fn coins_of(address: &str, chain: &[Block], pool: &[SignedTransaction]) -> Result<i64> {
        let balance = Self::raw_balance(address, chain, pool);
        if balance < 0 {
            return Err(BlockchainError::NegativeBalance {
                address: address.to_string(),
                balance,
            });
        }
        Ok(balance)
    }

    /// Amount must be positive and no larger than what the sender still has
    /// after everything already spent on chain and in the pool.
    pub fn check_balance(
        signed_tx: &SignedTransaction,
        chain: &[Block],
        pool: &[SignedTransaction],
    ) -> bool {
        Self::balance_rejection(signed_tx, chain, pool).is_none()
    }

    fn balance_rejection(
        signed_tx: &SignedTransaction,
        chain: &[Block],
        pool: &[SignedTransaction],
    ) -> Option<TransactionRejection> {
        let amount = signed_tx.get_amount();
        if amount == 0 || i64::try_from(amount).is_err() {
            return Some(TransactionRejection::NonPositiveAmount);
        }
        let available = Self::raw_balance(signed_tx.get_sender(), chain, pool);
        if to_signed(amount) > available {
            return Some(TransactionRejection::InsufficientFunds {
                required: amount,
                available,
            });
        }
        None
    }

    /// Full admission check for a pending transaction: duplicate, time, balance and
    /// signature, in that order.
    pub fn validate_transaction(
        signed_tx: &SignedTransaction,
        chain: &[Block],
        pool: &[SignedTransaction],
    ) -> std::result::Result<(), TransactionRejection> {
        let already_known = pool.contains(signed_tx)
            || chain
                .iter()
                .skip(1)
                .any(|block| block.get_transactions().contains(signed_tx));
        if already_known {
            return Err(TransactionRejection::Duplicate);
        }
        if !Self::check_transaction_time(signed_tx, chain, pool) {
            return Err(TransactionRejection::StaleTimestamp {
                timestamp: signed_tx.get_timestamp(),
                latest: Self::latest_transaction_time(signed_tx.get_sender(), chain, pool),
            });
        }
        if let Some(rejection) = Self::balance_rejection(signed_tx, chain, pool) {
            return Err(rejection);
        }
        if !Self::verify_signature(signed_tx) {
            return Err(TransactionRejection::InvalidSignature);
        }
        Ok(())
    }

    /// Structural checks of a candidate against its predecessor, using the
    /// current wall-clock time.
    pub fn check_block_base(candidate: &Block, prev_block: &Block, difficulty: u32) -> bool {
        match current_timestamp() {
            Ok(now) => Self::inspect_block_base(candidate, prev_block, difficulty, now).is_ok(),
            Err(e) => {
                warn!("Cannot read the clock to validate block: {e}");
                false
            }
        }
    }

    /// Same as `check_block_base`, with the reason and an explicit `now`.
    pub fn inspect_block_base(
        candidate: &Block,
        prev_block: &Block,
        difficulty: u32,
        now: i64,
    ) -> std::result::Result<(), BlockRejection> {
        if now <= candidate.get_timestamp() {
            return Err(BlockRejection::FutureTimestamp {
                timestamp: candidate.get_timestamp(),
                now,
            });
        }
        Self::inspect_block_contents(candidate, prev_block, difficulty)
    }

    // Linkage, proof of work, digest and hash; no clock involved
    fn inspect_block_contents(
        candidate: &Block,
        prev_block: &Block,
        difficulty: u32,
    ) -> std::result::Result<(), BlockRejection> {
        if candidate.get_previous_hash() != prev_block.get_hash() {
            return Err(BlockRejection::PreviousHashMismatch);
        }
        if !meets_difficulty(candidate.get_hash(), difficulty) {
            return Err(BlockRejection::InsufficientWork { difficulty });
        }
        if candidate.hash_transactions() != candidate.get_transactions_digest() {
            return Err(BlockRejection::DigestMismatch);
        }
        if candidate.calculate_hash() != candidate.get_hash() {
            return Err(BlockRejection::HashMismatch);
        }
        Ok(())
    }

    /// A mined block carries exactly one reward of the fixed value.
    pub fn check_block_reward(candidate: &Block) -> bool {
        candidate
            .get_miner_reward()
            .map(|reward| reward.get_amount() == REWARD_VALUE)
            .unwrap_or(false)
    }

    /// Every transaction in the candidate must be pending right now, and each pool
    /// entry can back at most one occurrence in the block.
    pub fn check_block_transactions(candidate: &Block, pool: &[SignedTransaction]) -> bool {
        let mut available: HashMap<&SignedTransaction, usize> = HashMap::new();
        for tx in pool {
            *available.entry(tx).or_insert(0) += 1;
        }
        candidate.get_transactions().iter().all(|tx| match available.get_mut(tx) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        })
    }

    /// True when any transaction appears more than once across the given blocks.
    /// Pass `chain.iter().chain(once(&candidate))` to include a candidate.
    pub fn has_duplicate_transactions<'a, I>(blocks: I) -> bool
    where
        I: IntoIterator<Item = &'a Block>,
    {
        let mut seen: HashMap<&SignedTransaction, usize> = HashMap::new();
        for block in blocks {
            for tx in block.get_transactions() {
                let count = seen.entry(tx).or_insert(0);
                *count += 1;
                if *count > 1 {
                    return true;
                }
            }
        }
        false
    }

    /// Apply a list of transfers to a running balance map.
    pub fn update_balance_map(transactions: &[SignedTransaction], balance_map: &mut BalanceMap) {
        for tx in transactions {
            let amount = to_signed(tx.get_amount());
            let receiver = balance_map.entry(tx.get_receiver().to_string()).or_insert(0);
            *receiver = receiver.saturating_add(amount);
            let sender = balance_map.entry(tx.get_sender().to_string()).or_insert(0);
            *sender = sender.saturating_sub(amount);
        }
    }

    /// Credit a block reward to a running balance map.
    pub fn update_balance_map_with_reward(reward: &MinerReward, balance_map: &mut BalanceMap) {
        let entry = balance_map.entry(reward.get_miner().to_string()).or_insert(0);
        *entry = entry.saturating_add(to_signed(reward.get_amount()));
    }

    /// Total spent per sender in a list of transactions
    pub fn get_outgoings_map(transactions: &[SignedTransaction]) -> BalanceMap {
        let mut outgoings = BalanceMap::new();
        for tx in transactions {
            let entry = outgoings.entry(tx.get_sender().to_string()).or_insert(0);
            *entry = entry.saturating_add(to_signed(tx.get_amount()));
        }
        outgoings
    }

    pub fn check_no_negative(balance_map: &BalanceMap) -> bool {
        balance_map.values().all(|balance| *balance >= 0)
    }

    /// Signature check of every transaction in a block already on chain.
    pub fn check_existing_block_transactions(block: &Block) -> bool {
        block.get_transactions().iter().all(Self::verify_signature)
    }

    /// Signatures plus balances, for a block applied on top of `balances`
    /// (the balances after all previous blocks). Updates `balances` in place.
    pub fn check_existing_block_transactions_with_balances(
        block: &Block,
        balances: &mut BalanceMap,
    ) -> bool {
        if !Self::check_existing_block_transactions(block) {
            return false;
        }

        let outgoings = Self::get_outgoings_map(block.get_transactions());
        let covered = outgoings
            .iter()
            .all(|(sender, spent)| balances.get(sender).copied().unwrap_or(0) >= *spent);

        Self::update_balance_map(block.get_transactions(), balances);
        if let Some(reward) = block.get_miner_reward() {
            Self::update_balance_map_with_reward(reward, balances);
        }

        covered && Self::check_no_negative(balances)
    }

    /// Replay every rule over a whole chain in one pass: linkage, digest, hash,
    /// proof of work against a replayed difficulty, signatures, balances and
    /// duplicates. Used when a loaded chain should not be taken on trust.
    pub fn verify_chain(chain: &[Block], initial_difficulty: u32) -> bool {
        let genesis = match chain.first() {
            Some(block) if block.is_genesis() => block,
            _ => {
                warn!("Chain does not start with a genesis block");
                return false;
            }
        };
        if genesis.get_hash() != crate::core::GENESIS_HASH {
            warn!("Genesis block has an unexpected hash");
            return false;
        }

        let controller = DifficultyController::with_difficulty(initial_difficulty);
        let mut balances = BalanceMap::new();

        for (index, block) in chain.iter().enumerate().skip(1) {
            if block.get_height() as usize != index {
                warn!("Block at position {index} claims height {}", block.get_height());
                return false;
            }
            let difficulty = controller.get_difficulty();
            if let Err(rejection) = Self::inspect_block_contents(block, &chain[index - 1], difficulty)
            {
                warn!("Block {index} failed verification: {rejection}");
                return false;
            }
            if !Self::check_block_reward(block) {
                warn!("Block {index} failed verification: {}", BlockRejection::InvalidReward);
                return false;
            }
            if !Self::check_existing_block_transactions_with_balances(block, &mut balances) {
                warn!("Block {index} has bad signatures or overspends");
                return false;
            }
            controller.adjust(&chain[..=index]);
        }

        if Self::has_duplicate_transactions(chain) {
            warn!("Chain contains duplicated transactions");
            return false;
        }
        true
    }
}

// Amounts above i64::MAX cannot be admitted, so saturating is only a guard for
// hand-built blocks.
fn to_signed(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}
