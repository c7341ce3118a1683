//! Test utilities for ledger testing

use crate::core::{Address, HashMode, Ledger, LedgerParams, Miner, Transaction};
use crate::error::Result;
use tempfile::TempDir;

/// Test configuration for ledger testing
pub struct TestConfig {
    pub difficulty: u32,
    pub mining_reward: u64,
    pub max_nonce: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            difficulty: 1, // Easy difficulty for fast testing
            mining_reward: 10,
            max_nonce: 100_000,
        }
    }
}

impl TestConfig {
    pub fn params(&self) -> LedgerParams {
        LedgerParams {
            difficulty: self.difficulty,
            mining_reward: self.mining_reward,
            hash_mode: HashMode::Modern,
        }
    }

    pub fn miner(&self) -> Miner {
        Miner::new(self.max_nonce)
    }
}

pub fn easy_params() -> LedgerParams {
    TestConfig::default().params()
}

pub fn easy_miner() -> Miner {
    TestConfig::default().miner()
}

/// Fee-less transfer; panics on malformed input
pub fn tx(from: Address, to: Address, value: u64) -> Transaction {
    Transaction::new(from, to, value).unwrap()
}

/// Create a temporary directory for testing
pub fn create_temp_dir() -> Result<TempDir> {
    tempfile::tempdir().map_err(|e| crate::error::BlockchainError::Io(e.to_string()))
}

/// Three funded accounts and a handful of pending transfers, one unaffordable
pub fn funded_ledger() -> Ledger {
    let mut ledger = Ledger::new([(0, 50), (1, 20), (2, 5)], easy_params()).unwrap();
    for transfer in [tx(0, 1, 10), tx(2, 3, 6), tx(1, 2, 25), tx(2, 0, 5), tx(3, 0, 1)] {
        ledger.submit_transaction(transfer).unwrap();
    }
    ledger
}

/// Seal every pending transfer, rewarding address 9
pub fn mine_all(mut ledger: Ledger, block_size: usize) -> Ledger {
    ledger
        .build_blocks(&easy_miner(), block_size, Some(9))
        .unwrap();
    ledger
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funded_ledger() {
        let ledger = funded_ledger();
        assert_eq!(ledger.pending_transactions().len(), 5);
        assert_eq!(ledger.balance(0), 50);
    }

    #[test]
    fn test_mine_all_produces_valid_chain() {
        let ledger = mine_all(funded_ledger(), 2);
        // (2, 3, 6) and (3, 0, 1) cannot be covered
        assert_eq!(ledger.height(), 2);
        assert!(ledger.pending_transactions().is_empty());
        assert!(ledger.is_chain_valid());
    }
}
