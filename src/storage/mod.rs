//! Data storage and persistence
//!
//! This module holds the pending transaction pool, the Sled-backed store that
//! saves simulation progress between runs, and the JSON export of the chain.

pub mod export;
pub mod persistence;
pub mod transaction_pool;

pub use export::{export_chain_json, import_chain_json};
pub use persistence::{Storage, DEFAULT_DATA_DIR, EXPORT_FILE};
pub use transaction_pool::TransactionPool;
