//! Testnet helpers for ledger testing
//!
//! Cheap difficulty settings and ready-made ledgers so unit tests can seal
//! blocks quickly.

pub mod test_utils;

pub use test_utils::*;
