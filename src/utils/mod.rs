//! Utility functions and helpers
//!
//! This module contains the hashing primitives, timestamps
//! and JSON helpers used throughout the ledger.

pub mod crypto;
pub mod serialization;

pub use crypto::{current_timestamp, sha1_digest, sha1_hex, sha256_digest, sha256_hex};

pub use serialization::{from_json, to_json};
