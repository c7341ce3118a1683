//! Data storage and persistence
//!
//! The pending pool of submitted transactions and the JSON file that holds a
//! ledger snapshot between runs.

pub mod chain_store;
pub mod memory_pool;

pub use chain_store::{ChainStore, DEFAULT_STORE_FILE};
pub use memory_pool::PendingPool;
