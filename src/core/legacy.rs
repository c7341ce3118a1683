//! Legacy text protocol
//!
//! Older callers hand over positional start balances and `[from, to, value]`
//! triples and expect one line back describing the last sealed block:
//! `"<hash>, <prev_hash>, <nonce>, [[f, t, v], ...]"`. Hashing is SHA-1 over
//! the legacy preimage with four leading hex zeros, and the first block links
//! to a 44 character zero placeholder.

use crate::core::transaction::legacy_list;
use crate::core::{Ledger, LedgerParams, Miner, Transaction};
use crate::error::Result;
use log::debug;

/// Run the legacy protocol with the default nonce ceiling
pub fn get_latest_block(
    start_balances: &[u64],
    pending_transactions: &[[i64; 3]],
    block_size: usize,
) -> Result<String> {
    get_latest_block_with(&Miner::default(), start_balances, pending_transactions, block_size)
}

/// Same as [`get_latest_block`] with an explicit miner.
///
/// Returns an empty string when no transaction was admissible.
pub fn get_latest_block_with(
    miner: &Miner,
    start_balances: &[u64],
    pending_transactions: &[[i64; 3]],
    block_size: usize,
) -> Result<String> {
    let mut ledger = Ledger::from_start_balances(start_balances, LedgerParams::legacy())?;

    for triple in pending_transactions {
        match Transaction::from_legacy(*triple) {
            Ok(tx) => ledger.submit_transaction(tx)?,
            Err(err) => debug!("Skipping malformed legacy transaction {triple:?}: {err}"),
        }
    }

    ledger.build_blocks(miner, block_size, None)?;
    Ok(ledger.latest_block().map(format_block).unwrap_or_default())
}

fn format_block(block: &crate::core::Block) -> String {
    format!(
        "{}, {}, {}, {}",
        block.calculate_hash(),
        block.get_previous_hash(),
        block.get_nonce(),
        legacy_list(block.get_transactions())
    )
}
