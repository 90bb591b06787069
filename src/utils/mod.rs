//! Utility functions and helpers
//!
//! Hashing, encoding and signature primitives plus the bincode helpers
//! used by the storage layer.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_decode, base58_encode, checksum, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, hash160, hex_decode, hex_encode, new_key_pair,
    ripemd160_digest, sha256_digest, sha256_hex, CHECKSUM_LEN,
};

pub use serialization::{deserialize, serialize};
