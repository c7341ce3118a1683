//! Core ledger functionality
//!
//! Transactions, merkle roots, blocks, nonce search, the ledger with its
//! admission algorithm and chain validation, and the legacy text protocol.

pub mod block;
pub mod blockchain;
pub mod difficulty;
pub mod legacy;
pub mod merkle;
pub mod proof_of_work;
pub mod transaction;

pub use block::{meets_difficulty, Block, HashMode, PowPreimage};
pub use blockchain::{
    admit_transactions, Admission, Balances, ChainStats, Ledger, LedgerParams, LedgerSnapshot,
};
pub use difficulty::{
    DifficultyAdjustment, INITIAL_DIFFICULTY, LEGACY_DIFFICULTY, MAX_DIFFICULTY, MIN_DIFFICULTY,
    RETARGET_WINDOW,
};
pub use legacy::{get_latest_block, get_latest_block_with};
pub use merkle::MerkleTree;
pub use proof_of_work::{Miner, MiningOutcome, DEFAULT_MAX_NONCE};
pub use transaction::{legacy_list, Address, Transaction, MINT_ADDRESS};
