// The ledger holds account balances, the sealed chain and the pending pool.
// Admission is a single ordered pass over the pool with a running balance
// overlay; a transfer the sender cannot cover at its turn is dropped for good.

use crate::core::difficulty::{LEGACY_DIFFICULTY, RETARGET_WINDOW};
use crate::core::{Address, Block, DifficultyAdjustment, HashMode, Miner, Transaction};
use crate::error::{BlockchainError, Result};
use crate::storage::PendingPool;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub type Balances = HashMap<Address, u64>;

/// Consensus parameters a ledger is created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerParams {
    pub difficulty: u32,
    pub mining_reward: u64,
    pub hash_mode: HashMode,
}

impl Default for LedgerParams {
    fn default() -> Self {
        LedgerParams {
            difficulty: crate::core::INITIAL_DIFFICULTY,
            mining_reward: 10,
            hash_mode: HashMode::Modern,
        }
    }
}

impl LedgerParams {
    /// Four hex zeros, SHA-1, no reward
    pub fn legacy() -> Self {
        LedgerParams {
            difficulty: LEGACY_DIFFICULTY,
            mining_reward: 0,
            hash_mode: HashMode::Legacy,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !DifficultyAdjustment::is_valid_difficulty(self.difficulty) {
            return Err(BlockchainError::Config(format!(
                "Difficulty must be between 1 and 8, got {}",
                self.difficulty
            )));
        }
        if self.hash_mode == HashMode::Legacy {
            if self.difficulty != LEGACY_DIFFICULTY {
                return Err(BlockchainError::Config(format!(
                    "Legacy difficulty is fixed at {LEGACY_DIFFICULTY}, got {}",
                    self.difficulty
                )));
            }
            if self.mining_reward != 0 {
                return Err(BlockchainError::Config(
                    "Legacy blocks cannot carry a mining reward".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Result of one admission pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Admission {
    pub admitted: Vec<Transaction>,
    pub rejected: Vec<Transaction>,
    /// Candidates looked at before the limit was reached
    pub considered: usize,
}

/// Sequential admission over `candidates` in order.
///
/// A transfer is admitted iff its sender holds at least `value + fee` after
/// the effects of the transfers admitted before it. Only touched accounts are
/// copied into the overlay, so the pass is linear in the number of candidates.
pub fn admit_transactions<'a, I>(balances: &Balances, candidates: I, limit: Option<usize>) -> Admission
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut overlay: HashMap<Address, u64> = HashMap::new();
    let mut admission = Admission::default();

    for tx in candidates {
        if limit.is_some_and(|limit| admission.admitted.len() >= limit) {
            break;
        }
        admission.considered += 1;

        let from = tx.get_from();
        let available = overlay
            .get(&from)
            .or_else(|| balances.get(&from))
            .copied()
            .unwrap_or(0);

        if tx.is_reward() || available < tx.total_cost() {
            debug!("Skipping {tx}: sender {from} holds {available}");
            admission.rejected.push(*tx);
            continue;
        }

        let to = tx.get_to();
        let Some(credited) = overlay
            .get(&to)
            .or_else(|| balances.get(&to))
            .copied()
            .unwrap_or(0)
            .checked_add(tx.get_value())
        else {
            debug!("Skipping {tx}: balance of {to} would overflow");
            admission.rejected.push(*tx);
            continue;
        };

        overlay.insert(from, available - tx.total_cost());
        overlay.insert(to, credited);
        admission.admitted.push(*tx);
    }

    admission
}

/// Apply a block's transactions in order, checking each one is affordable
/// and that the reward (if any) is the first transaction and pays `mining_reward`.
fn apply_block(balances: &mut Balances, block: &Block, mining_reward: u64) -> std::result::Result<(), String> {
    for (position, tx) in block.get_transactions().iter().enumerate() {
        if tx.is_reward() {
            if position != 0 {
                return Err(format!("reward at position {position}, expected first"));
            }
            if mining_reward == 0 || tx.get_value() != mining_reward {
                return Err(format!(
                    "reward of {} does not match configured reward {mining_reward}",
                    tx.get_value()
                ));
            }
        } else {
            let from = balances.entry(tx.get_from()).or_insert(0);
            if *from < tx.total_cost() {
                return Err(format!("{tx} exceeds sender balance {}", *from));
            }
            *from -= tx.total_cost();
        }

        let to = balances.entry(tx.get_to()).or_insert(0);
        *to = to
            .checked_add(tx.get_value())
            .ok_or_else(|| format!("{tx} overflows the balance of {}", tx.get_to()))?;
    }
    Ok(())
}

/// Balances without zero entries, in address order
fn normalized(balances: &Balances) -> BTreeMap<Address, u64> {
    balances
        .iter()
        .filter(|(_, balance)| **balance > 0)
        .map(|(address, balance)| (*address, *balance))
        .collect()
}

/// Everything needed to restore a ledger losslessly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub params: LedgerParams,
    pub genesis_balances: BTreeMap<Address, u64>,
    pub balances: BTreeMap<Address, u64>,
    pub chain: Vec<Block>,
    pub pending: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStats {
    pub total_blocks: usize,
    pub total_transactions: usize,
    pub total_value_transferred: u128,
    pub pending_transactions: usize,
    pub difficulty: u32,
    pub mining_reward: u64,
    pub active_addresses: usize,
}

impl fmt::Display for ChainStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Blocks: {}", self.total_blocks)?;
        writeln!(f, "Total Transactions: {}", self.total_transactions)?;
        writeln!(f, "Total Value Transferred: {}", self.total_value_transferred)?;
        writeln!(f, "Pending Transactions: {}", self.pending_transactions)?;
        writeln!(f, "Difficulty: {}", self.difficulty)?;
        writeln!(f, "Mining Reward: {}", self.mining_reward)?;
        writeln!(f, "Active Addresses: {}", self.active_addresses)
    }
}

/// Single-writer ledger; wrap it in a `Mutex` if several callers must share it
#[derive(Debug, Clone)]
pub struct Ledger {
    params: LedgerParams,
    genesis_balances: Balances,
    balances: Balances,
    chain: Vec<Block>,
    pending: PendingPool,
}

impl Ledger {
    pub fn new<I>(initial_balances: I, params: LedgerParams) -> Result<Ledger>
    where
        I: IntoIterator<Item = (Address, u64)>,
    {
        params.validate()?;

        let mut genesis_balances = Balances::new();
        for (address, balance) in initial_balances {
            if address < 0 {
                return Err(BlockchainError::Config(format!(
                    "Initial balance for negative address {address}"
                )));
            }
            let entry = genesis_balances.entry(address).or_insert(0);
            *entry = entry.checked_add(balance).ok_or_else(|| {
                BlockchainError::Config(format!("Initial balance for {address} overflows"))
            })?;
        }

        Ok(Ledger {
            params,
            balances: genesis_balances.clone(),
            genesis_balances,
            chain: Vec::new(),
            pending: PendingPool::new(),
        })
    }

    /// Starting balances given positionally: index = address
    pub fn from_start_balances(start_balances: &[u64], params: LedgerParams) -> Result<Ledger> {
        Self::new(
            start_balances
                .iter()
                .enumerate()
                .map(|(address, balance)| (address as Address, *balance)),
            params,
        )
    }

    pub fn get_params(&self) -> LedgerParams {
        self.params
    }

    pub fn get_difficulty(&self) -> u32 {
        self.params.difficulty
    }

    pub fn get_mining_reward(&self) -> u64 {
        self.params.mining_reward
    }

    pub fn get_hash_mode(&self) -> HashMode {
        self.params.hash_mode
    }

    pub fn balance(&self, address: Address) -> u64 {
        self.balances.get(&address).copied().unwrap_or(0)
    }

    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    pub fn genesis_balances(&self) -> &Balances {
        &self.genesis_balances
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn height(&self) -> usize {
        self.chain.len()
    }

    pub fn latest_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Sealed hash of the tail, or the genesis placeholder for an empty chain
    pub fn tail_hash(&self) -> String {
        self.chain
            .last()
            .map(Block::calculate_hash)
            .unwrap_or_else(|| self.params.hash_mode.genesis_hash())
    }

    pub fn pending_transactions(&self) -> &PendingPool {
        &self.pending
    }

    /// Pool a transaction after checking it is well formed.
    ///
    /// Affordability is not checked here; that happens at admission time.
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<()> {
        tx.validate()?;
        if tx.is_reward() {
            return Err(BlockchainError::InvalidTransaction(
                "Reward transactions are created by the ledger".to_string(),
            ));
        }
        if self.params.hash_mode == HashMode::Legacy && tx.get_fee() != 0 {
            return Err(BlockchainError::InvalidTransaction(
                "Legacy transactions cannot carry a fee".to_string(),
            ));
        }
        debug!("Pooled transaction {tx}");
        self.pending.add(tx);
        Ok(())
    }

    /// Run admission over the pending pool against the current balances
    pub fn admit_pending(&self, limit: Option<usize>) -> Admission {
        admit_transactions(&self.balances, self.pending.iter(), limit)
    }

    /// Unsealed block for `transfers`, prefixed by the reward when one is due
    pub fn prepare_block(
        &self,
        index: u64,
        previous_hash: String,
        transfers: &[Transaction],
        reward_address: Option<Address>,
    ) -> Result<Block> {
        let mut transactions = Vec::with_capacity(transfers.len() + 1);
        if let Some(address) = reward_address.filter(|_| self.params.mining_reward > 0) {
            transactions.push(Transaction::reward(address, self.params.mining_reward)?);
        }
        transactions.extend_from_slice(transfers);

        Block::new_block(
            index,
            previous_hash,
            transactions,
            self.params.difficulty,
            self.params.hash_mode,
        )
    }

    /// Seal one block per chunk, each linked to the previous one. Nothing is
    /// committed here, so an exhausted search leaves the ledger untouched.
    fn seal_chunks(
        &self,
        transfers: &[Transaction],
        block_size: usize,
        miner: &Miner,
        reward_address: Option<Address>,
    ) -> Result<Vec<Block>> {
        let mut previous_hash = self.tail_hash();
        let mut blocks = Vec::new();

        for (offset, chunk) in transfers.chunks(block_size).enumerate() {
            let index = (self.chain.len() + offset) as u64;
            let mut block = self.prepare_block(index, previous_hash, chunk, reward_address)?;
            let outcome = miner.mine(&mut block)?;
            previous_hash = outcome.hash;
            blocks.push(block);
        }

        Ok(blocks)
    }

    /// Admit the whole pool, cut it into `block_size` chunks and seal them all.
    ///
    /// On `MiningExhausted` no block is appended and the pool is unchanged.
    /// On success the pool is emptied: admitted transfers are in the chain and
    /// inadmissible ones are discarded.
    pub fn build_blocks(
        &mut self,
        miner: &Miner,
        block_size: usize,
        reward_address: Option<Address>,
    ) -> Result<Vec<Block>> {
        Self::check_block_size(block_size)?;
        let admission = self.admit_pending(None);
        info!(
            "Admitted {} of {} pending transactions",
            admission.admitted.len(),
            admission.considered
        );

        let blocks = self.seal_chunks(&admission.admitted, block_size, miner, reward_address)?;

        let height = self.chain.len();
        let balances = self.balances.clone();
        for block in &blocks {
            if let Err(err) = self.commit_block(block.clone()) {
                self.chain.truncate(height);
                self.balances = balances;
                return Err(err);
            }
        }
        self.pending.drain_front(admission.considered);
        Ok(blocks)
    }

    /// Seal a single block from the first `block_size` admissible transfers.
    ///
    /// Transfers considered and found inadmissible are discarded; anything past
    /// the cut-off stays pending. Returns `None` when nothing was admissible.
    pub fn mine_pending_transactions(
        &mut self,
        miner: &Miner,
        block_size: usize,
        reward_address: Option<Address>,
    ) -> Result<Option<Block>> {
        Self::check_block_size(block_size)?;
        let admission = self.admit_pending(Some(block_size));
        if admission.admitted.is_empty() {
            self.pending.drain_front(admission.considered);
            return Ok(None);
        }

        let mut blocks =
            self.seal_chunks(&admission.admitted, block_size, miner, reward_address)?;
        let block = blocks.pop().ok_or_else(|| {
            BlockchainError::InvalidBlock("No block produced for admitted transfers".to_string())
        })?;
        self.commit_block(block.clone())?;
        self.pending.drain_front(admission.considered);
        Ok(Some(block))
    }

    fn check_block_size(block_size: usize) -> Result<()> {
        if block_size == 0 {
            return Err(BlockchainError::Config(
                "Block size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Accept an externally sealed block after re-validating it against the tail
    pub fn add_block(&mut self, block: Block) -> Result<()> {
        let transfers: Vec<Transaction> = block.transfers().copied().collect();
        self.commit_block(block)?;
        self.pending.remove_included(&transfers);
        Ok(())
    }

    fn commit_block(&mut self, block: Block) -> Result<()> {
        let balances = self.verify_block(&block)?;
        info!(
            "Appending {} with {} transfer(s)",
            block,
            block.transfer_count()
        );
        self.balances = balances;
        self.chain.push(block);
        Ok(())
    }

    /// Check `block` can follow the current tail; returns the balances after it
    pub fn verify_block(&self, block: &Block) -> Result<Balances> {
        block.check_structure()?;

        let invalid = |msg: String| Err(BlockchainError::InvalidBlock(msg));
        if block.get_index() != self.chain.len() as u64 {
            return invalid(format!(
                "index {} does not follow height {}",
                block.get_index(),
                self.chain.len()
            ));
        }
        if block.get_previous_hash() != self.tail_hash() {
            return invalid("previous hash does not match the chain tail".to_string());
        }
        if block.get_hash_mode() != self.params.hash_mode {
            return invalid(format!("hash mode {} not accepted", block.get_hash_mode()));
        }
        if block.get_difficulty() != self.params.difficulty {
            return invalid(format!(
                "difficulty {} differs from ledger difficulty {}",
                block.get_difficulty(),
                self.params.difficulty
            ));
        }
        if block.transfer_count() == 0 {
            return invalid("block must contain at least one transfer".to_string());
        }
        if !block.is_sealed() {
            return invalid("proof-of-work does not satisfy difficulty".to_string());
        }

        let mut balances = self.balances.clone();
        if let Err(reason) = apply_block(&mut balances, block, self.params.mining_reward) {
            return invalid(reason);
        }
        Ok(balances)
    }

    /// Walk the chain from genesis re-deriving every hash, then replay all
    /// transactions and require the replayed balances to equal the current ones.
    pub fn validate_chain(&self) -> Result<()> {
        let corrupted = |msg: String| {
            warn!("Chain validation failed: {msg}");
            Err(BlockchainError::ChainCorrupted(msg))
        };

        let mut previous_hash = self.params.hash_mode.genesis_hash();
        let mut replayed = self.genesis_balances.clone();

        for (height, block) in self.chain.iter().enumerate() {
            if let Err(err) = block.check_structure() {
                return corrupted(format!("block {height}: {err}"));
            }
            if block.get_index() != height as u64 {
                return corrupted(format!(
                    "block at height {height} claims index {}",
                    block.get_index()
                ));
            }
            if block.get_hash_mode() != self.params.hash_mode {
                return corrupted(format!("block {height} uses hash mode {}", block.get_hash_mode()));
            }
            if block.get_previous_hash() != previous_hash {
                return corrupted(format!(
                    "block {height} does not link to its predecessor"
                ));
            }

            let difficulty = block.get_difficulty();
            if !DifficultyAdjustment::is_valid_difficulty(difficulty) {
                return corrupted(format!("block {height} claims difficulty {difficulty}"));
            }
            if self.params.hash_mode == HashMode::Legacy && difficulty != LEGACY_DIFFICULTY {
                return corrupted(format!(
                    "legacy block {height} claims difficulty {difficulty}, expected {LEGACY_DIFFICULTY}"
                ));
            }

            let hash = block.calculate_hash();
            if !crate::core::block::meets_difficulty(&hash, difficulty) {
                return corrupted(format!(
                    "block {height} hash {hash} does not satisfy difficulty {}",
                    block.get_difficulty()
                ));
            }
            if let Err(reason) = apply_block(&mut replayed, block, self.params.mining_reward) {
                return corrupted(format!("block {height}: {reason}"));
            }
            previous_hash = hash;
        }

        if normalized(&replayed) != normalized(&self.balances) {
            return corrupted("replayed balances differ from the ledger".to_string());
        }
        Ok(())
    }

    pub fn is_chain_valid(&self) -> bool {
        self.validate_chain().is_ok()
    }

    /// Every sealed transaction sending to or from `address`, in chain order
    pub fn transaction_history(&self, address: Address) -> Vec<Transaction> {
        self.chain
            .iter()
            .flat_map(|block| block.get_transactions())
            .filter(|tx| tx.involves(address))
            .copied()
            .collect()
    }

    pub fn stats(&self) -> ChainStats {
        ChainStats {
            total_blocks: self.chain.len(),
            total_transactions: self.chain.iter().map(|b| b.get_transactions().len()).sum(),
            total_value_transferred: self.chain.iter().map(Block::transaction_total).sum(),
            pending_transactions: self.pending.len(),
            difficulty: self.params.difficulty,
            mining_reward: self.params.mining_reward,
            active_addresses: self.balances.values().filter(|b| **b > 0).count(),
        }
    }

    /// Recompute the difficulty for future blocks from the recent intervals.
    /// Legacy ledgers keep their fixed difficulty.
    pub fn retarget(&mut self, target_block_time_ms: u64) -> u32 {
        if self.params.hash_mode == HashMode::Legacy {
            return self.params.difficulty;
        }
        let start = self.chain.len().saturating_sub(RETARGET_WINDOW);
        self.params.difficulty = DifficultyAdjustment::next_difficulty(
            &self.chain[start..],
            self.params.difficulty,
            target_block_time_ms,
        );
        self.params.difficulty
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            params: self.params,
            genesis_balances: self.genesis_balances.iter().map(|(a, b)| (*a, *b)).collect(),
            balances: self.balances.iter().map(|(a, b)| (*a, *b)).collect(),
            chain: self.chain.clone(),
            pending: self.pending.get_all(),
        }
    }

    /// Rebuild a ledger from a snapshot, refusing chains that fail validation
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Ledger> {
        snapshot.params.validate()?;
        for tx in &snapshot.pending {
            tx.validate()?;
        }

        let ledger = Ledger {
            params: snapshot.params,
            genesis_balances: snapshot.genesis_balances.into_iter().collect(),
            balances: snapshot.balances.into_iter().collect(),
            chain: snapshot.chain,
            pending: snapshot.pending.into_iter().collect(),
        };
        ledger.validate_chain()?;
        Ok(ledger)
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ledger({} blocks, {} pending transactions)",
            self.chain.len(),
            self.pending.len()
        )
    }
}
