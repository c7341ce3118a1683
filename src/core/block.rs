use crate::core::transaction::legacy_list;
use crate::core::{MerkleTree, Transaction};
use crate::error::{BlockchainError, Result};
use crate::utils::{current_timestamp, sha1_hex, sha256_hex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hashing strategy and preimage layout for blocks
///
/// `Modern` hashes a colon separated header with SHA-256. `Legacy` reproduces
/// the older SHA-1 text format so existing outputs can be matched byte for byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashMode {
    #[default]
    Modern,
    Legacy,
}

impl HashMode {
    pub fn hash_hex(self, data: &[u8]) -> String {
        match self {
            HashMode::Modern => sha256_hex(data),
            HashMode::Legacy => sha1_hex(data),
        }
    }

    /// Placeholder previous-hash of the first block
    pub fn genesis_hash(self) -> String {
        match self {
            HashMode::Modern => "0".repeat(64),
            HashMode::Legacy => "0".repeat(44),
        }
    }
}

impl FromStr for HashMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "modern" | "sha256" => Ok(HashMode::Modern),
            "legacy" | "sha1" => Ok(HashMode::Legacy),
            _ => Err(format!(
                "Invalid hash mode: {s}. Valid options: modern, legacy"
            )),
        }
    }
}

impl fmt::Display for HashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashMode::Modern => write!(f, "modern"),
            HashMode::Legacy => write!(f, "legacy"),
        }
    }
}

/// True iff `hash` starts with at least `difficulty` zero hex characters
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// Everything a block hash covers except the nonce, rendered once per search
#[derive(Debug, Clone)]
pub struct PowPreimage {
    prefix: String,
    suffix: String,
    mode: HashMode,
}

impl PowPreimage {
    pub fn hash(&self, nonce: u64) -> String {
        let data = format!("{}{}{}", self.prefix, nonce, self.suffix);
        self.mode.hash_hex(data.as_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    timestamp: i64,
    previous_hash: String,
    nonce: u64,
    difficulty: u32,
    hash_mode: HashMode,
    transactions: Vec<Transaction>,
}

impl Block {
    /// Unsealed block with its timestamp pinned now
    pub fn new_block(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        difficulty: u32,
        hash_mode: HashMode,
    ) -> Result<Block> {
        Self::with_timestamp(
            index,
            current_timestamp()?,
            previous_hash,
            transactions,
            difficulty,
            hash_mode,
        )
    }

    pub fn with_timestamp(
        index: u64,
        timestamp: i64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        difficulty: u32,
        hash_mode: HashMode,
    ) -> Result<Block> {
        let block = Block {
            index,
            timestamp,
            previous_hash,
            nonce: 0,
            difficulty,
            hash_mode,
            transactions,
        };
        block.check_structure()?;
        Ok(block)
    }

    /// Field-level checks that do not depend on the chain
    pub fn check_structure(&self) -> Result<()> {
        if self.difficulty == 0 {
            return Err(BlockchainError::InvalidBlock(
                "Difficulty must be at least 1".to_string(),
            ));
        }
        if self.previous_hash.is_empty()
            || !self.previous_hash.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(BlockchainError::InvalidBlock(format!(
                "Previous hash is not a hex digest: {:?}",
                self.previous_hash
            )));
        }
        for tx in &self.transactions {
            tx.validate()?;
        }
        Ok(())
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn get_hash_mode(&self) -> HashMode {
        self.hash_mode
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    /// Only the miner moves the nonce
    pub(crate) fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    pub fn get_merkle_root(&self) -> String {
        MerkleTree::calculate_merkle_root(&self.transactions, self.hash_mode)
    }

    pub fn pow_preimage(&self) -> PowPreimage {
        match self.hash_mode {
            HashMode::Legacy => PowPreimage {
                prefix: format!("{}, ", self.previous_hash),
                suffix: format!(", {}", legacy_list(&self.transactions)),
                mode: HashMode::Legacy,
            },
            HashMode::Modern => PowPreimage {
                prefix: format!(
                    "{}:{}:{}:{}:",
                    self.index, self.timestamp, self.difficulty, self.previous_hash
                ),
                suffix: format!(":{}", self.get_merkle_root()),
                mode: HashMode::Modern,
            },
        }
    }

    pub fn calculate_hash(&self) -> String {
        self.pow_preimage().hash(self.nonce)
    }

    pub fn is_valid(&self, difficulty: u32) -> bool {
        meets_difficulty(&self.calculate_hash(), difficulty)
    }

    /// Proof-of-work check against the block's own difficulty
    pub fn is_sealed(&self) -> bool {
        self.is_valid(self.difficulty)
    }

    pub fn reward(&self) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.is_reward())
    }

    pub fn transfers(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|tx| !tx.is_reward())
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers().count()
    }

    /// Widened so a block of near-maximal transfers cannot overflow
    pub fn transaction_total(&self) -> u128 {
        self.transactions.iter().map(|tx| u128::from(tx.get_value())).sum()
    }

    pub fn total_fees(&self) -> u128 {
        self.transactions.iter().map(|tx| u128::from(tx.get_fee())).sum()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hash = self.calculate_hash();
        write!(
            f,
            "Block {} ({} transactions, hash: {}...)",
            self.index,
            self.transactions.len(),
            &hash[..12.min(hash.len())]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block(mode: HashMode) -> Block {
        let txs = vec![
            Transaction::new(0, 1, 5).unwrap(),
            Transaction::new(1, 2, 5).unwrap(),
        ];
        Block::with_timestamp(1, 1_700_000_000_000, mode.genesis_hash(), txs, 2, mode).unwrap()
    }

    #[test]
    fn test_hash_is_deterministic() {
        let block = sample_block(HashMode::Modern);
        assert_eq!(block.calculate_hash(), block.calculate_hash());
        assert_eq!(block.calculate_hash().len(), 64);
    }

    #[test]
    fn test_hash_changes_with_nonce() {
        let mut block = sample_block(HashMode::Modern);
        let before = block.calculate_hash();
        block.set_nonce(1);
        assert_ne!(before, block.calculate_hash());
    }

    #[test]
    fn test_hash_is_order_sensitive() {
        let block = sample_block(HashMode::Modern);
        let mut reversed = block.clone();
        reversed.transactions.reverse();
        assert_ne!(block.calculate_hash(), reversed.calculate_hash());
    }

    #[test]
    fn test_tampering_changes_hash() {
        let block = sample_block(HashMode::Modern);
        let mut tampered = block.clone();
        tampered.transactions[1] = Transaction::new(1, 2, 4).unwrap();
        assert_ne!(block.calculate_hash(), tampered.calculate_hash());

        let legacy = sample_block(HashMode::Legacy);
        let mut tampered = legacy.clone();
        tampered.transactions[0] = Transaction::new(0, 1, 6).unwrap();
        assert_ne!(legacy.calculate_hash(), tampered.calculate_hash());
    }

    #[test]
    fn test_legacy_preimage_format() {
        let block = sample_block(HashMode::Legacy);
        let expected = sha1_hex(
            format!("{}, 0, [[0, 1, 5], [1, 2, 5]]", "0".repeat(44)).as_bytes(),
        );
        assert_eq!(block.calculate_hash(), expected);
    }

    #[test]
    fn test_legacy_hash_ignores_timestamp() {
        let a = sample_block(HashMode::Legacy);
        let mut b = a.clone();
        b.timestamp += 1;
        assert_eq!(a.calculate_hash(), b.calculate_hash());

        let c = sample_block(HashMode::Modern);
        let mut d = c.clone();
        d.timestamp += 1;
        assert_ne!(c.calculate_hash(), d.calculate_hash());
    }

    #[test]
    fn test_meets_difficulty() {
        assert!(meets_difficulty("0000ab", 4));
        assert!(meets_difficulty("00000b", 4));
        assert!(!meets_difficulty("000ab0", 4));
        assert!(!meets_difficulty("00", 4));
    }

    #[test]
    fn test_invalid_structure_rejected() {
        let zero_difficulty =
            Block::with_timestamp(1, 0, "0".repeat(64), vec![], 0, HashMode::Modern);
        assert!(matches!(zero_difficulty, Err(BlockchainError::InvalidBlock(_))));

        let bad_hash = Block::with_timestamp(1, 0, "xyz".to_string(), vec![], 1, HashMode::Modern);
        assert!(matches!(bad_hash, Err(BlockchainError::InvalidBlock(_))));
    }

    #[test]
    fn test_totals_and_reward() {
        let txs = vec![
            Transaction::reward(9, 10).unwrap(),
            Transaction::with_fee(0, 1, 5, 1).unwrap(),
            Transaction::with_fee(1, 2, 3, 2).unwrap(),
        ];
        let block =
            Block::with_timestamp(1, 0, "0".repeat(64), txs, 1, HashMode::Modern).unwrap();

        assert_eq!(block.transaction_total(), 18);
        assert_eq!(block.total_fees(), 3);
        assert_eq!(block.transfer_count(), 2);
        assert_eq!(block.reward().map(Transaction::get_to), Some(9));
    }

    #[test]
    fn test_hash_mode_parsing() {
        assert_eq!("legacy".parse::<HashMode>().unwrap(), HashMode::Legacy);
        assert_eq!("SHA256".parse::<HashMode>().unwrap(), HashMode::Modern);
        assert!("md5".parse::<HashMode>().is_err());
        assert_eq!(HashMode::Legacy.genesis_hash().len(), 44);
    }
}
