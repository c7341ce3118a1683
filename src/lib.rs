//! # Tally Chain
//!
//! A single-node proof-of-work ledger with integer account addresses.
//!
//! ## What it does
//! - **Admission**: pending transfers are checked in submission order against
//!   running balances; a transfer the sender cannot cover is dropped for good
//! - **Sealing**: admitted transfers are cut into fixed-size blocks and each
//!   block gets the lowest nonce whose hash has enough leading hex zeros,
//!   searched sequentially or across worker threads with the same result
//! - **Validation**: the chain is walked from genesis re-deriving every hash
//!   and replaying every transaction against the starting balances
//! - **Legacy protocol**: [`get_latest_block`] reproduces the SHA-1 text
//!   format older callers expect
//!
//! ## Layout
//! - `core/`: transactions, merkle roots, blocks, mining, the ledger
//! - `storage/`: pending pool and the JSON snapshot store
//! - `config/`: layered configuration (defaults, TOML, environment)
//! - `utils/`: hashing, timestamps, JSON helpers
//! - `cli/`: command-line definitions for the binary

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{BalanceArg, Command, Opt};
pub use config::Config;
pub use core::{
    admit_transactions, get_latest_block, get_latest_block_with, meets_difficulty, Address,
    Admission, Block, ChainStats, DifficultyAdjustment, HashMode, Ledger, LedgerParams,
    LedgerSnapshot, MerkleTree, Miner, MiningOutcome, Transaction, DEFAULT_MAX_NONCE,
    MINT_ADDRESS,
};
pub use error::{BlockchainError, Result};
pub use storage::{ChainStore, PendingPool};
pub use utils::{current_timestamp, sha1_hex, sha256_hex};
