//! Core ledger functionality
//!
//! This module contains the data model (transactions, blocks), the canonical
//! hashing rules, validation, difficulty adjustment, the proof-of-work search
//! and the ledger that ties them together.

pub mod block;
pub mod difficulty;
pub mod digest;
pub mod ledger;
pub mod proof_of_work;
pub mod transaction;
pub mod validator;

pub use block::{Block, GENESIS_HASH};
pub use difficulty::DifficultyController;
pub use digest::{block_hash, meets_difficulty, transactions_digest, EMPTY_TRANSACTIONS_TEXT};
pub use ledger::{Ledger, REWARD_VALUE};
pub use proof_of_work::ProofOfWork;
pub use transaction::{MinerReward, SignedTransaction, Transaction, COIN_UNIT, NO_REWARD};
pub use validator::{BalanceMap, BlockRejection, TransactionRejection, Validator};
