use crate::core::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Transactions awaiting inclusion, in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingPool {
    inner: VecDeque<Transaction>,
}

impl PendingPool {
    pub fn new() -> PendingPool {
        PendingPool {
            inner: VecDeque::new(),
        }
    }

    pub fn add(&mut self, tx: Transaction) {
        self.inner.push_back(tx);
    }

    /// Drop the first `count` transactions, which have been considered for a block
    pub fn drain_front(&mut self, count: usize) {
        let count = count.min(self.inner.len());
        self.inner.drain(..count);
    }

    /// Remove the first pooled copy of each transaction included in a block
    pub fn remove_included(&mut self, included: &[Transaction]) {
        for tx in included {
            if let Some(position) = self.inner.iter().position(|pending| pending == tx) {
                self.inner.remove(position);
            }
        }
    }

    pub fn contains(&self, tx: &Transaction) -> bool {
        self.inner.contains(tx)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.inner.iter()
    }

    pub fn get_all(&self) -> Vec<Transaction> {
        self.inner.iter().copied().collect()
    }
}

impl FromIterator<Transaction> for PendingPool {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        PendingPool {
            inner: iter.into_iter().collect(),
        }
    }
}
