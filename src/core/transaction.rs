// Value transfers between addresses. A transaction only says who pays whom how much;
// the signed wrapper adds the time it was created, the signature over the canonical
// text and the public key needed to check that signature.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Unit rendered after every amount in canonical strings
pub const COIN_UNIT: &str = "VC";

/// Canonical rendering of a missing miner reward (only the genesis block has none)
pub const NO_REWARD: &str = "No reward";

// Equality is purely structural: same sender, receiver and amount means same transfer
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Transaction {
    sender: String,
    receiver: String,
    amount: u64,
}

impl Transaction {
    pub fn new(sender: &str, receiver: &str, amount: u64) -> Transaction {
        Transaction {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
        }
    }

    pub fn get_sender(&self) -> &str {
        self.sender.as_str()
    }

    pub fn get_receiver(&self) -> &str {
        self.receiver.as_str()
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }
}

// This is the canonical render used for signing and hashing, so it must never change
impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sent {} {COIN_UNIT} to {}",
            self.sender, self.amount, self.receiver
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct SignedTransaction {
    transaction: Transaction,
    timestamp: i64,     // Milliseconds since the Unix epoch, set by the signer
    signature: Vec<u8>, // Signature over `signing_string()`
    public_key: Vec<u8>,
}

impl SignedTransaction {
    pub fn new(
        transaction: Transaction,
        timestamp: i64,
        signature: Vec<u8>,
        public_key: Vec<u8>,
    ) -> SignedTransaction {
        SignedTransaction {
            transaction,
            timestamp,
            signature,
            public_key,
        }
    }

    /// The exact text a wallet signs and a validator verifies:
    /// `render(transaction) + "\n" + timestamp`.
    pub fn signing_string(transaction: &Transaction, timestamp: i64) -> String {
        format!("{transaction}\n{timestamp}")
    }

    pub fn string_for_hashing(&self) -> String {
        Self::signing_string(&self.transaction, self.timestamp)
    }

    pub fn get_transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn get_sender(&self) -> &str {
        self.transaction.get_sender()
    }

    pub fn get_receiver(&self) -> &str {
        self.transaction.get_receiver()
    }

    pub fn get_amount(&self) -> u64 {
        self.transaction.get_amount()
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_signature(&self) -> &[u8] {
        self.signature.as_slice()
    }

    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }
}

// Identity covers transaction, timestamp and signature. The public key is left out:
// a resend with a new timestamp is a different transaction, a re-keyed copy is not.
impl PartialEq for SignedTransaction {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
            && self.transaction == other.transaction
            && self.signature == other.signature
    }
}

impl Eq for SignedTransaction {}

impl Hash for SignedTransaction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.transaction.hash(state);
        self.timestamp.hash(state);
        self.signature.hash(state);
    }
}

impl fmt::Display for SignedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.transaction.fmt(f)
    }
}

/// Coins minted to the miner of a block; not taken from anyone's balance.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct MinerReward {
    miner: String,
    amount: u64,
}

impl MinerReward {
    pub fn new(miner: &str, amount: u64) -> MinerReward {
        MinerReward {
            miner: miner.to_string(),
            amount,
        }
    }

    pub fn get_miner(&self) -> &str {
        self.miner.as_str()
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    /// Canonical rendering of an optional reward, as it enters the block hash
    pub fn render(reward: Option<&MinerReward>) -> String {
        match reward {
            Some(reward) => reward.to_string(),
            None => NO_REWARD.to_string(),
        }
    }
}

impl fmt::Display for MinerReward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} gets {} {COIN_UNIT}", self.miner, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_canonical_renders() {
        let tx = Transaction::new("FC", "SC", 30);
        assert_eq!(tx.to_string(), "FC sent 30 VC to SC");

        let signed = SignedTransaction::new(tx, 5, vec![1], vec![1]);
        assert_eq!(signed.string_for_hashing(), "FC sent 30 VC to SC\n5");

        let reward = MinerReward::new("FC", 100);
        assert_eq!(reward.to_string(), "FC gets 100 VC");
        assert_eq!(MinerReward::render(Some(&reward)), "FC gets 100 VC");
        assert_eq!(MinerReward::render(None), NO_REWARD);
    }

    #[test]
    fn test_identity_ignores_public_key() {
        let tx = Transaction::new("FC", "SC", 30);
        let a = SignedTransaction::new(tx.clone(), 5, vec![1], vec![1]);
        let b = SignedTransaction::new(tx.clone(), 5, vec![1], vec![2]);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn test_new_timestamp_is_a_new_transaction() {
        let tx = Transaction::new("FC", "SC", 30);
        let first = SignedTransaction::new(tx.clone(), 5, vec![1], vec![1]);
        let resent = SignedTransaction::new(tx.clone(), 6, vec![1], vec![1]);
        let resigned = SignedTransaction::new(tx, 5, vec![9], vec![1]);
        assert_ne!(first, resent);
        assert_ne!(first, resigned);
    }
}
