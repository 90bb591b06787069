//! Canonical hashing rules shared by miners and validators
//!
//! A miner and the ledger must compute exactly the same strings here, byte
//! for byte, or no block will ever be accepted.

use crate::core::{MinerReward, SignedTransaction};
use crate::utils::sha256_hex;
use once_cell::sync::Lazy;

/// Text hashed in place of the joined digests when a block carries no transactions
pub const EMPTY_TRANSACTIONS_TEXT: &str = "No transactions";

/// Digest of an empty transaction list, computed once
pub static EMPTY_TRANSACTIONS_DIGEST: Lazy<String> =
    Lazy::new(|| sha256_hex(EMPTY_TRANSACTIONS_TEXT));

/// Order-sensitive digest of a transaction list.
///
/// Each transaction's hashing string is SHA-256'd on its own, the hex digests are
/// joined with `"\n"` in list order and the joined text is hashed once more.
pub fn transactions_digest(transactions: &[SignedTransaction]) -> String {
    if transactions.is_empty() {
        return EMPTY_TRANSACTIONS_DIGEST.clone();
    }

    let joined = transactions
        .iter()
        .map(|tx| sha256_hex(&tx.string_for_hashing()))
        .collect::<Vec<String>>()
        .join("\n");
    sha256_hex(&joined)
}

/// Block hash over `render(reward) + height + timestamp + nonce + previous_hash + digest`,
/// integers in decimal.
pub fn block_hash(
    miner_reward: Option<&MinerReward>,
    height: u32,
    timestamp: i64,
    nonce: u64,
    previous_hash: &str,
    transactions_digest: &str,
) -> String {
    let data = format!(
        "{}{height}{timestamp}{nonce}{previous_hash}{transactions_digest}",
        MinerReward::render(miner_reward)
    );
    sha256_hex(&data)
}

/// Whether `hash` starts with at least `difficulty` literal `'0'` characters.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let required = difficulty as usize;
    hash.len() >= required && hash.bytes().take(required).all(|b| b == b'0')
}
