use crate::core::{Ledger, SignedTransaction, Transaction};
use crate::error::{BlockchainError, Result};
use crate::utils::{
    base58_decode, base58_encode, checksum, current_timestamp, ecdsa_p256_sha256_sign_digest,
    hash160, new_key_pair, CHECKSUM_LEN,
};
use log::debug;
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
use serde::{Deserialize, Serialize};

const VERSION: u8 = 0x00;
pub const ADDRESS_CHECK_SUM_LEN: usize = CHECKSUM_LEN;

/// A key pair plus the address derived from its public half.
///
/// The ledger never sees a wallet, only the `SignedTransaction`s it produces.
#[derive(Clone, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Wallet {
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let pkcs8 = new_key_pair()?;
        Self::from_pkcs8(pkcs8)
    }

    /// Rebuild a wallet from stored key material
    pub fn from_pkcs8(pkcs8: Vec<u8>) -> Result<Wallet> {
        let rng = SystemRandom::new();
        let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &pkcs8, &rng)
            .map_err(|e| {
                BlockchainError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
            })?;
        let public_key = key_pair.public_key().as_ref().to_vec();
        Ok(Wallet { pkcs8, public_key })
    }

    pub fn get_address(&self) -> String {
        convert_address(&hash_pub_key(self.public_key.as_slice()))
    }

    pub fn get_public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    pub fn get_pkcs8(&self) -> &[u8] {
        self.pkcs8.as_slice()
    }

    /// Sign `transaction` as created at `timestamp` (ms)
    pub fn sign_transaction(
        &self,
        transaction: Transaction,
        timestamp: i64,
    ) -> Result<SignedTransaction> {
        let input = SignedTransaction::signing_string(&transaction, timestamp);
        let signature = ecdsa_p256_sha256_sign_digest(&self.pkcs8, input.as_bytes())?;
        Ok(SignedTransaction::new(
            transaction,
            timestamp,
            signature,
            self.public_key.clone(),
        ))
    }

    /// A transfer from this wallet, stamped with the current time
    pub fn create_transaction(&self, receiver: &str, amount: u64) -> Result<SignedTransaction> {
        let transaction = Transaction::new(&self.get_address(), receiver, amount);
        self.sign_transaction(transaction, current_timestamp()?)
    }

    pub fn balance(&self, ledger: &Ledger) -> Result<i64> {
        ledger.coins_of(&self.get_address())
    }

    /// Create, sign and submit a transfer. `Ok(false)` means the ledger turned it
    /// down; an error means the wallet itself is broken.
    pub fn send(&self, ledger: &Ledger, receiver: &str, amount: u64) -> Result<bool> {
        let signed_tx = self.create_transaction(receiver, amount)?;
        let accepted = ledger.add_transaction(signed_tx);
        debug!(
            "{} sending {amount} to {receiver}: {}",
            self.get_address(),
            if accepted { "accepted" } else { "rejected" }
        );
        Ok(accepted)
    }
}

/// RIPEMD160(SHA256(public key))
pub fn hash_pub_key(pub_key: &[u8]) -> Vec<u8> {
    hash160(pub_key)
}

pub fn validate_address(address: &str) -> bool {
    let payload = match base58_decode(address) {
        Ok(payload) => payload,
        Err(_) => return false, // Invalid base58 encoding
    };

    // Check if payload is long enough
    if payload.len() < ADDRESS_CHECK_SUM_LEN + 1 {
        return false;
    }

    let (versioned, actual_checksum) = payload.split_at(payload.len() - ADDRESS_CHECK_SUM_LEN);
    checksum(versioned).as_slice() == actual_checksum
}

/// version + pub_key_hash + checksum, base58-encoded
pub fn convert_address(pub_hash_key: &[u8]) -> String {
    let mut payload: Vec<u8> = vec![];
    payload.push(VERSION);
    payload.extend(pub_hash_key);
    let checksum = checksum(payload.as_slice());
    payload.extend(checksum.as_slice());
    base58_encode(payload.as_slice())
}
