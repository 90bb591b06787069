//! Test fixtures shared by the unit tests
//!
//! Temporary storage, real and placeholder signed transactions, cheap block
//! mining helpers and the small FC/SC/TC chain used by the balance tests.

pub mod test_utils;

pub use test_utils::*;
