use crate::core::block::meets_difficulty;
use crate::core::Block;
use crate::error::{BlockchainError, Result};
use log::{debug, info};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_MAX_NONCE: u64 = 1_000_000;

const PROGRESS_INTERVAL: u64 = 100_000;

/// Result of a successful nonce search
#[derive(Debug, Clone, PartialEq)]
pub struct MiningOutcome {
    pub nonce: u64,
    pub hash: String,
    /// Hashes computed across all workers, including overrun after the find
    pub attempts: u64,
    pub elapsed: Duration,
}

impl MiningOutcome {
    /// Hashes per second, zero when the search finished too fast to time
    pub fn hash_rate(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            self.attempts as f64 / seconds
        } else {
            0.0
        }
    }
}

/// Nonce search over `0..max_nonce`, always settling on the lowest valid nonce
#[derive(Debug, Clone)]
pub struct Miner {
    max_nonce: u64,
    workers: usize,
}

impl Default for Miner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NONCE)
    }
}

impl Miner {
    pub fn new(max_nonce: u64) -> Miner {
        Miner {
            max_nonce,
            workers: 1,
        }
    }

    /// More than one worker switches `mine` to the parallel search
    pub fn with_workers(mut self, workers: usize) -> Miner {
        self.workers = workers.max(1);
        self
    }

    pub fn get_max_nonce(&self) -> u64 {
        self.max_nonce
    }

    pub fn get_workers(&self) -> usize {
        self.workers
    }

    /// Seal `block` in place; on failure the block is left untouched
    pub fn mine(&self, block: &mut Block) -> Result<MiningOutcome> {
        info!(
            "Mining block {} with difficulty {} ({} worker(s))",
            block.get_index(),
            block.get_difficulty(),
            self.workers
        );
        let outcome = if self.workers > 1 {
            self.mine_parallel(block, self.workers)?
        } else {
            self.mine_sequential(block)?
        };
        let hash_rate = outcome.hash_rate();
        info!(
            "Sealed block {} with nonce {} after {} attempts ({:.0} H/s, ~{:.2}s expected per block): {}",
            block.get_index(),
            outcome.nonce,
            outcome.attempts,
            hash_rate,
            Self::estimate_mining_time(block.get_difficulty(), hash_rate),
            outcome.hash
        );
        Ok(outcome)
    }

    /// Linear scan `0, 1, 2, ...`
    pub fn mine_sequential(&self, block: &mut Block) -> Result<MiningOutcome> {
        let start = Instant::now();
        let difficulty = block.get_difficulty();
        let preimage = block.pow_preimage();

        for nonce in 0..self.max_nonce {
            if nonce > 0 && nonce % PROGRESS_INTERVAL == 0 {
                debug!("Mining progress: tried {nonce} nonces");
            }
            let hash = preimage.hash(nonce);
            if meets_difficulty(&hash, difficulty) {
                block.set_nonce(nonce);
                return Ok(MiningOutcome {
                    nonce,
                    hash,
                    attempts: nonce + 1,
                    elapsed: start.elapsed(),
                });
            }
        }

        Err(self.exhausted(difficulty))
    }

    /// Interleaved search: worker `w` tries `w, w + n, w + 2n, ...`.
    ///
    /// `best` holds the lowest hit so far. A worker stops as soon as its next
    /// nonce is not below `best`, so every nonce under the final value has
    /// been tried and rejected by someone; the result equals the sequential one.
    pub fn mine_parallel(&self, block: &mut Block, workers: usize) -> Result<MiningOutcome> {
        let start = Instant::now();
        let difficulty = block.get_difficulty();
        let preimage = block.pow_preimage();
        let stride = workers.max(1) as u64;
        let max_nonce = self.max_nonce;

        let best = AtomicU64::new(u64::MAX);
        let attempts = AtomicU64::new(0);

        thread::scope(|scope| {
            for worker in 0..stride {
                let preimage = preimage.clone();
                let best = &best;
                let attempts = &attempts;
                scope.spawn(move || {
                    let mut tried = 0u64;
                    let mut nonce = worker;
                    while nonce < max_nonce && nonce < best.load(Ordering::Acquire) {
                        tried += 1;
                        if meets_difficulty(&preimage.hash(nonce), difficulty) {
                            best.fetch_min(nonce, Ordering::AcqRel);
                            break;
                        }
                        nonce = match nonce.checked_add(stride) {
                            Some(next) => next,
                            None => break,
                        };
                    }
                    attempts.fetch_add(tried, Ordering::Relaxed);
                });
            }
        });

        let nonce = best.into_inner();
        if nonce == u64::MAX {
            return Err(self.exhausted(difficulty));
        }

        block.set_nonce(nonce);
        Ok(MiningOutcome {
            nonce,
            hash: block.calculate_hash(),
            attempts: attempts.into_inner(),
            elapsed: start.elapsed(),
        })
    }

    fn exhausted(&self, difficulty: u32) -> BlockchainError {
        BlockchainError::MiningExhausted {
            max_nonce: self.max_nonce,
            difficulty,
        }
    }

    /// Validate proof-of-work for a block
    pub fn validate(block: &Block) -> bool {
        block.is_sealed()
    }

    /// Expected seconds to seal at `difficulty` hex zeros given a hash rate
    pub fn estimate_mining_time(difficulty: u32, hash_rate: f64) -> f64 {
        let expected_hashes = 16f64.powi(difficulty as i32);
        if hash_rate > 0.0 {
            expected_hashes / hash_rate
        } else {
            f64::INFINITY
        }
    }
}
