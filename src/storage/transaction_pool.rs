use crate::core::{Block, SignedTransaction, TransactionRejection, Validator};
use log::{debug, error, warn};
use std::sync::RwLock;

/// Validated transactions waiting to be mined, in arrival order.
///
/// Order matters: the latest pending transaction of a sender is the one its next
/// transaction's timestamp is compared against.
pub struct TransactionPool {
    inner: RwLock<Vec<SignedTransaction>>,
}

impl Default for TransactionPool {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionPool {
    pub fn new() -> TransactionPool {
        TransactionPool {
            inner: RwLock::new(vec![]),
        }
    }

    pub fn with_transactions(transactions: Vec<SignedTransaction>) -> TransactionPool {
        TransactionPool {
            inner: RwLock::new(transactions),
        }
    }

    /// Validate against `chain` and the live pool, then insert. Rejections are
    /// logged and reported as `false`.
    pub fn add(&self, signed_tx: SignedTransaction, chain: &[Block]) -> bool {
        match self.try_add(signed_tx, chain) {
            Ok(()) => true,
            Err(rejection) => {
                warn!("Transaction rejected: {rejection}");
                false
            }
        }
    }

    /// Same as `add` with the reason for a rejection. Validation and insertion
    /// happen under one write lock so two submissions cannot both spend the same coins.
    pub fn try_add(
        &self,
        signed_tx: SignedTransaction,
        chain: &[Block],
    ) -> std::result::Result<(), TransactionRejection> {
        match self.inner.write() {
            Ok(mut pool) => {
                Validator::validate_transaction(&signed_tx, chain, &pool)?;
                debug!("Transaction added to pool: {signed_tx}");
                pool.push(signed_tx);
                Ok(())
            }
            Err(_) => {
                error!("Failed to acquire write lock on transaction pool");
                Err(TransactionRejection::PoolUnavailable)
            }
        }
    }

    /// Drop every transaction the block carries. Only called once the block is on chain.
    pub fn remove_included(&self, block: &Block) {
        match self.inner.write() {
            Ok(mut pool) => {
                let included = block.get_transactions();
                pool.retain(|tx| !included.contains(tx));
            }
            Err(_) => {
                error!("Failed to acquire write lock on transaction pool");
            }
        }
    }

    /// Independent copy of the current contents
    pub fn snapshot(&self) -> Vec<SignedTransaction> {
        match self.inner.read() {
            Ok(pool) => pool.clone(),
            Err(_) => {
                error!("Failed to acquire read lock on transaction pool");
                Vec::new()
            }
        }
    }

    /// Run `f` against the live contents while holding the read lock
    pub fn with_snapshot<T, F>(&self, f: F) -> Option<T>
    where
        F: FnOnce(&[SignedTransaction]) -> T,
    {
        match self.inner.read() {
            Ok(pool) => Some(f(&pool)),
            Err(_) => {
                error!("Failed to acquire read lock on transaction pool");
                None
            }
        }
    }

    pub fn contains(&self, signed_tx: &SignedTransaction) -> bool {
        self.with_snapshot(|pool| pool.contains(signed_tx))
            .unwrap_or(false)
    }

    /// Replace the contents wholesale without validation (bulk load)
    pub fn replace_all(&self, transactions: Vec<SignedTransaction>) {
        match self.inner.write() {
            Ok(mut pool) => {
                *pool = transactions;
            }
            Err(_) => {
                error!("Failed to acquire write lock on transaction pool");
            }
        }
    }

    pub fn clear(&self) {
        self.replace_all(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.with_snapshot(|pool| pool.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.with_snapshot(|pool| pool.is_empty()).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;
    use crate::testnet::{balance_fixture_chain, mine_block_on, signed_dummy, TestKeys};

    #[test]
    fn test_add_valid_transaction() {
        let miner = TestKeys::generate();
        let chain = miner.chain_with_reward();
        let pool = TransactionPool::new();

        let tx = miner.sign(Transaction::new(&miner.address, "SC", 40), 2_000);
        assert!(pool.add(tx.clone(), &chain));
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&tx));

        // Same transaction again is a duplicate
        assert_eq!(
            pool.try_add(tx, &chain),
            Err(TransactionRejection::Duplicate)
        );
    }

    #[test]
    fn test_pending_spend_counts_against_balance() {
        let miner = TestKeys::generate();
        let chain = miner.chain_with_reward();
        let pool = TransactionPool::new();

        assert!(pool.add(miner.sign(Transaction::new(&miner.address, "SC", 70), 2_000), &chain));
        let over = miner.sign(Transaction::new(&miner.address, "TC", 31), 2_001);
        assert!(matches!(
            pool.try_add(over, &chain),
            Err(TransactionRejection::InsufficientFunds { .. })
        ));
        assert!(pool.add(miner.sign(Transaction::new(&miner.address, "TC", 30), 2_002), &chain));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_rejections_leave_pool_untouched() {
        let chain = balance_fixture_chain();
        let pool = TransactionPool::new();

        assert!(!pool.add(signed_dummy("FC", "SC", 10, 20), &chain));
        assert!(!pool.add(signed_dummy("TC", "SC", 10, 20), &chain));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_remove_included() {
        let first = signed_dummy("FC", "TC", 10, 10);
        let second = signed_dummy("SC", "TC", 10, 12);
        let pool = TransactionPool::with_transactions(vec![first.clone(), second.clone()]);

        let genesis = Block::generate_genesis_block();
        let block = mine_block_on(&genesis, vec![first.clone()], None, 0, 1);
        pool.remove_included(&block);

        assert_eq!(pool.snapshot(), vec![second]);
        assert!(!pool.contains(&first));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let pool = TransactionPool::with_transactions(vec![signed_dummy("FC", "TC", 10, 10)]);
        let mut copy = pool.snapshot();
        copy.clear();
        assert_eq!(pool.len(), 1);

        pool.replace_all(vec![]);
        assert!(pool.is_empty());
    }
}
