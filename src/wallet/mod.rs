//! Wallet management and cryptographic operations
//!
//! This module handles key pairs, address generation and transaction signing
//! for the participants of the simulation.

#[allow(clippy::module_inception)]
pub mod wallet;
pub mod wallets;

pub use wallet::{convert_address, hash_pub_key, validate_address, Wallet, ADDRESS_CHECK_SUM_LEN};
pub use wallets::Wallets;
