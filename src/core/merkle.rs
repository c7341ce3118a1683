use crate::core::{HashMode, Transaction};
use serde::{Deserialize, Serialize};

/// Merkle tree over the canonical encodings of an ordered transaction list
///
/// Every level is kept so the tree can later serve membership proofs;
/// today only the root is consumed (by block hashing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleTree {
    levels: Vec<Vec<String>>,
    mode: HashMode,
}

impl MerkleTree {
    /// Create a new Merkle tree from a list of transactions
    pub fn new(transactions: &[Transaction], mode: HashMode) -> Self {
        let encodings: Vec<String> = transactions.iter().map(|tx| tx.canonical(mode)).collect();
        Self::from_encodings(&encodings, mode)
    }

    /// Create a Merkle tree from already encoded leaves
    pub fn from_encodings(encodings: &[String], mode: HashMode) -> Self {
        let leaves: Vec<String> = encodings
            .iter()
            .map(|encoding| mode.hash_hex(encoding.as_bytes()))
            .collect();

        MerkleTree {
            levels: Self::build_levels(leaves, mode),
            mode,
        }
    }

    /// Build the tree bottom-up; an odd level pairs its last hash with itself
    fn build_levels(leaves: Vec<String>, mode: HashMode) -> Vec<Vec<String>> {
        if leaves.is_empty() {
            return Vec::new();
        }

        let mut levels = vec![leaves];
        while let Some(current_level) = levels.last().filter(|level| level.len() > 1) {
            let next_level: Vec<String> = current_level
                .chunks(2)
                .map(|pair| {
                    let left = &pair[0];
                    let right = pair.get(1).unwrap_or(left);
                    Self::hash_pair(left, right, mode)
                })
                .collect();
            levels.push(next_level);
        }
        levels
    }

    fn hash_pair(left: &str, right: &str, mode: HashMode) -> String {
        let mut combined = String::with_capacity(left.len() + right.len());
        combined.push_str(left);
        combined.push_str(right);
        mode.hash_hex(combined.as_bytes())
    }

    /// Root hash; an empty tree hashes the empty string
    pub fn get_root_hash(&self) -> String {
        self.levels
            .last()
            .and_then(|level| level.first())
            .cloned()
            .unwrap_or_else(|| self.mode.hash_hex(b""))
    }

    /// Get the number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Number of levels including the leaves
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Check if the tree is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Utility functions for Merkle tree operations
impl MerkleTree {
    /// Calculate the Merkle root of a transaction list without keeping the tree
    pub fn calculate_merkle_root(transactions: &[Transaction], mode: HashMode) -> String {
        Self::new(transactions, mode).get_root_hash()
    }

    /// Verify that a list of transactions produces the expected Merkle root
    pub fn verify_transactions(
        transactions: &[Transaction],
        expected_root: &str,
        mode: HashMode,
    ) -> bool {
        Self::calculate_merkle_root(transactions, mode) == expected_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::sha256_hex;

    fn txs(triples: &[(i64, i64, u64)]) -> Vec<Transaction> {
        triples
            .iter()
            .map(|&(from, to, value)| Transaction::new(from, to, value).unwrap())
            .collect()
    }

    #[test]
    fn test_empty_transaction_list() {
        let tree = MerkleTree::new(&[], HashMode::Modern);
        assert!(tree.is_empty());
        assert_eq!(tree.get_root_hash(), sha256_hex(b""));
    }

    #[test]
    fn test_single_transaction_root_is_leaf_hash() {
        let list = txs(&[(1, 2, 100)]);
        let root = MerkleTree::calculate_merkle_root(&list, HashMode::Modern);
        assert_eq!(root, sha256_hex(b"[1, 2, 100, 0]"));
    }

    #[test]
    fn test_two_transactions() {
        let list = txs(&[(1, 2, 100), (2, 3, 50)]);
        let left = sha256_hex(b"[1, 2, 100, 0]");
        let right = sha256_hex(b"[2, 3, 50, 0]");
        let expected = sha256_hex(format!("{left}{right}").as_bytes());

        assert_eq!(MerkleTree::calculate_merkle_root(&list, HashMode::Modern), expected);
    }

    #[test]
    fn test_odd_count_duplicates_last_hash() {
        let list = txs(&[(1, 2, 100), (2, 3, 50), (3, 4, 25)]);
        let tree = MerkleTree::new(&list, HashMode::Modern);

        let h: Vec<String> = list
            .iter()
            .map(|tx| sha256_hex(tx.full_form().as_bytes()))
            .collect();
        let left = sha256_hex(format!("{}{}", h[0], h[1]).as_bytes());
        let right = sha256_hex(format!("{}{}", h[2], h[2]).as_bytes());
        let expected = sha256_hex(format!("{left}{right}").as_bytes());

        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.get_root_hash(), expected);
    }

    #[test]
    fn test_root_is_order_sensitive() {
        let forward = txs(&[(1, 2, 100), (2, 3, 50)]);
        let backward = txs(&[(2, 3, 50), (1, 2, 100)]);
        assert_ne!(
            MerkleTree::calculate_merkle_root(&forward, HashMode::Modern),
            MerkleTree::calculate_merkle_root(&backward, HashMode::Modern)
        );
    }

    #[test]
    fn test_verify_transactions() {
        let list = txs(&[(1, 2, 100), (2, 3, 50), (3, 4, 25)]);
        let root = MerkleTree::calculate_merkle_root(&list, HashMode::Modern);
        assert!(MerkleTree::verify_transactions(&list, &root, HashMode::Modern));

        let tampered = txs(&[(1, 2, 101), (2, 3, 50), (3, 4, 25)]);
        assert!(!MerkleTree::verify_transactions(&tampered, &root, HashMode::Modern));
    }

    #[test]
    fn test_legacy_mode_uses_short_digests() {
        let list = txs(&[(1, 2, 100), (2, 3, 50)]);
        let root = MerkleTree::calculate_merkle_root(&list, HashMode::Legacy);
        assert_eq!(root.len(), 40);
    }
}
