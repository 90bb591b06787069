//! # vc-ledger - My Proof-of-Work Ledger Simulation
//!
//! This is a single-process ledger where a handful of miner threads race to extend
//! one shared chain while client threads keep feeding signed transfers into the pool.
//! When I come back to this code, here's what I need to remember:
//!
//! ## What I Built
//! - **Ledger**: Append-only chain guarded by one lock, with a pending transaction pool
//! - **Validation**: Signatures, timestamps and balances derived from chain history
//! - **Mining**: Proof-of-work over hex-digit prefixes with difficulty retargeting
//! - **Wallets**: ECDSA P-256 keys with Bitcoin-style addresses
//! - **Simulation**: Miner and client threads that stop at a target height
//! - **Persistence**: Sled database for progress plus a JSON export of the chain
//!
//! ## How I Organized My Code
//! - `core/`: Blocks, transactions, digests, difficulty, the validator and the ledger
//! - `wallet/`: Key management, address generation, transaction signing
//! - `simulation/`: Participants, miner and client workers, the run loop
//! - `storage/`: Transaction pool, sled persistence and the JSON export
//! - `config/`: Simulation settings from file and environment
//! - `utils/`: Cryptographic functions and serialization helpers
//! - `cli/`: Command-line interface
//!
//! ## Key Design Decisions I Made
//! - Balances are never stored; I recompute them from the chain and the pool
//! - Only one candidate per height can win: appending re-checks under the write lock
//! - A rejected block or transaction is a normal outcome, not an error
//! - A negative balance is the one thing that stops the whole simulation
//!
//! ## When I Need to Understand Something
//! 1. Start with `main.rs` to see the CLI commands
//! 2. Look at `core/ledger.rs` for how blocks get appended
//! 3. Check `core/validator.rs` for every acceptance rule
//! 4. Review `simulation/miner.rs` for the mining loop

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod simulation;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{SimulationConfig, DEFAULT_CONFIG_PATH};
pub use core::{
    Block, BlockRejection, DifficultyController, Ledger, MinerReward, ProofOfWork,
    SignedTransaction, Transaction, TransactionRejection, Validator, GENESIS_HASH, REWARD_VALUE,
};
pub use error::{BlockchainError, Result};
pub use simulation::{ShutdownFlag, SimulationReport, Simulator};
pub use storage::{export_chain_json, import_chain_json, Storage, TransactionPool};
pub use utils::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, sha256_hex,
};
pub use wallet::{
    convert_address, hash_pub_key, validate_address, Wallet, Wallets, ADDRESS_CHECK_SUM_LEN,
};
