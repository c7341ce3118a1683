// A transaction moves `value` units from one integer account to another.
// Accounts are plain integers; `MINT_ADDRESS` marks a reward created by the ledger.

use crate::core::HashMode;
use crate::error::{BlockchainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account identifier
pub type Address = i64;

/// Source address of minted mining rewards; no balance is debited for it
pub const MINT_ADDRESS: Address = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    from: Address,
    to: Address,
    value: u64,
    #[serde(default)]
    fee: u64,
}

impl Transaction {
    /// Fee-less transfer, the only form the legacy protocol knows
    pub fn new(from: Address, to: Address, value: u64) -> Result<Transaction> {
        Self::with_fee(from, to, value, 0)
    }

    pub fn with_fee(from: Address, to: Address, value: u64, fee: u64) -> Result<Transaction> {
        if from == MINT_ADDRESS {
            return Err(BlockchainError::InvalidTransaction(
                "Only the ledger may mint rewards".to_string(),
            ));
        }
        let tx = Transaction {
            from,
            to,
            value,
            fee,
        };
        tx.validate()?;
        Ok(tx)
    }

    /// Minted credit for the miner of a block
    pub fn reward(to: Address, amount: u64) -> Result<Transaction> {
        let tx = Transaction {
            from: MINT_ADDRESS,
            to,
            value: amount,
            fee: 0,
        };
        tx.validate()?;
        Ok(tx)
    }

    /// Build a transfer from a legacy `[from, to, value]` triple
    pub fn from_legacy(triple: [i64; 3]) -> Result<Transaction> {
        let [from, to, value] = triple;
        let value = u64::try_from(value).map_err(|_| {
            BlockchainError::InvalidTransaction(format!("Negative value {value}"))
        })?;
        Self::new(from, to, value)
    }

    pub fn validate(&self) -> Result<()> {
        if self.value == 0 {
            return Err(BlockchainError::InvalidTransaction(
                "Transaction value must be positive".to_string(),
            ));
        }
        if self.from < MINT_ADDRESS || self.to < 0 {
            return Err(BlockchainError::InvalidTransaction(format!(
                "Addresses must be non-negative (got {} -> {})",
                self.from, self.to
            )));
        }
        if self.from == self.to {
            return Err(BlockchainError::InvalidTransaction(
                "Cannot send transaction to the same address".to_string(),
            ));
        }
        if self.is_reward() && self.fee != 0 {
            return Err(BlockchainError::InvalidTransaction(
                "Reward transactions carry no fee".to_string(),
            ));
        }
        if self.value.checked_add(self.fee).is_none() {
            return Err(BlockchainError::InvalidTransaction(
                "Value plus fee overflows".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_from(&self) -> Address {
        self.from
    }

    pub fn get_to(&self) -> Address {
        self.to
    }

    pub fn get_value(&self) -> u64 {
        self.value
    }

    pub fn get_fee(&self) -> u64 {
        self.fee
    }

    /// Amount debited from the sender
    pub fn total_cost(&self) -> u64 {
        self.value.saturating_add(self.fee)
    }

    pub fn is_reward(&self) -> bool {
        self.from == MINT_ADDRESS
    }

    pub fn involves(&self, address: Address) -> bool {
        self.from == address || self.to == address
    }

    /// `[from, to, value]`, identical to the legacy wire rendering
    pub fn legacy_form(&self) -> String {
        format!("[{}, {}, {}]", self.from, self.to, self.value)
    }

    /// `[from, to, value, fee]`
    pub fn full_form(&self) -> String {
        format!("[{}, {}, {}, {}]", self.from, self.to, self.value, self.fee)
    }

    /// Encoding used for hashing and display under the given mode
    pub fn canonical(&self, mode: HashMode) -> String {
        match mode {
            HashMode::Legacy => self.legacy_form(),
            HashMode::Modern => self.full_form(),
        }
    }

    pub fn calculate_hash(&self, mode: HashMode) -> String {
        mode.hash_hex(self.canonical(mode).as_bytes())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_reward() {
            write!(f, "reward -> {}: {}", self.to, self.value)
        } else if self.fee > 0 {
            write!(f, "{} -> {}: {} (fee {})", self.from, self.to, self.value, self.fee)
        } else {
            write!(f, "{} -> {}: {}", self.from, self.to, self.value)
        }
    }
}

/// Render transactions the way the legacy protocol prints them: `[[0, 1, 5], [1, 2, 5]]`
pub fn legacy_list(transactions: &[Transaction]) -> String {
    let items: Vec<String> = transactions.iter().map(Transaction::legacy_form).collect();
    format!("[{}]", items.join(", "))
}
