// Entry point for the ledger CLI
// Every command loads the snapshot file, works on the in-memory ledger and saves it back
use clap::Parser;
use log::{error, info, LevelFilter};
use std::process;
use tally_chain::{
    get_latest_block_with, utils, BlockchainError, ChainStore, Command, Config, Ledger, Opt,
    Transaction,
};

fn main() {
    // Info by default, RUST_LOG still wins
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn load_config(opt: &Opt) -> tally_chain::Result<Config> {
    let base = match &opt.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::default(),
    };
    base.with_env_overrides()
}

fn run(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&opt)?;
    let store = ChainStore::new(opt.store.clone());

    match opt.command {
        Command::Init { balances, force } => {
            if store.exists() && !force {
                return Err(format!(
                    "{} already exists, pass --force to overwrite",
                    store.get_path().display()
                )
                .into());
            }
            let ledger = Ledger::new(
                balances.iter().map(|b| (b.address, b.amount)),
                config.ledger_params(),
            )?;
            store.save(&ledger)?;
            println!(
                "Created ledger (difficulty {}, reward {}, {} hashing)",
                ledger.get_difficulty(),
                ledger.get_mining_reward(),
                ledger.get_hash_mode()
            );
        }
        Command::Status => {
            let ledger = store.load()?;
            print!("{}", ledger.stats());
            println!("Tail Hash: {}", ledger.tail_hash());
        }
        Command::Balance { address } => {
            let ledger = store.load()?;
            println!("Balance of {address}: {}", ledger.balance(address));
        }
        Command::Send {
            from,
            to,
            amount,
            fee,
        } => {
            let mut ledger = store.load()?;
            let tx = Transaction::with_fee(from, to, amount, fee)?;
            ledger.submit_transaction(tx)?;
            store.save(&ledger)?;
            println!(
                "Queued {tx} ({} pending)",
                ledger.pending_transactions().len()
            );
        }
        Command::Mine {
            block_size,
            reward_address,
            workers,
            max_nonce,
            all,
        } => {
            let mut ledger = store.load()?;
            let config = Config {
                workers: workers.unwrap_or(config.workers),
                max_nonce: max_nonce.unwrap_or(config.max_nonce),
                ..config
            };
            config.validate()?;
            let miner = config.miner();

            // Nothing is saved if the nonce search runs out
            let blocks = if all {
                ledger.build_blocks(&miner, block_size, reward_address)?
            } else {
                ledger
                    .mine_pending_transactions(&miner, block_size, reward_address)?
                    .into_iter()
                    .collect()
            };
            store.save(&ledger)?;

            if blocks.is_empty() {
                println!("No admissible transactions to mine");
            }
            for block in &blocks {
                println!("{block}");
            }
        }
        Command::History { address } => {
            let ledger = store.load()?;
            let history = ledger.transaction_history(address);
            if history.is_empty() {
                println!("No transactions for {address}");
            }
            for tx in history {
                println!("{tx}");
            }
        }
        Command::ShowBlock { index } => {
            let ledger = store.load()?;
            let block = ledger.chain().get(index).ok_or_else(|| {
                BlockchainError::InvalidBlock(format!(
                    "No block at index {index} (height {})",
                    ledger.height()
                ))
            })?;
            println!("Index: {}", block.get_index());
            println!("Hash: {}", block.calculate_hash());
            println!("Previous Hash: {}", block.get_previous_hash());
            println!("Timestamp: {}", block.get_timestamp());
            println!("Nonce: {}", block.get_nonce());
            println!("Difficulty: {}", block.get_difficulty());
            println!("Merkle Root: {}", block.get_merkle_root());
            println!("Value Moved: {}", block.transaction_total());
            println!("Fees: {}", block.total_fees());
            for tx in block.get_transactions() {
                println!("- {tx}");
            }
        }
        Command::Validate => {
            let ledger = store.load()?;
            ledger.validate_chain()?;
            info!("Validated {} block(s)", ledger.height());
            println!("Chain is valid");
        }
        Command::Legacy {
            start_balances,
            transactions,
            block_size,
        } => {
            let start_balances: Vec<u64> = utils::from_json(&start_balances)?;
            let transactions: Vec<[i64; 3]> = utils::from_json(&transactions)?;
            let line =
                get_latest_block_with(&config.miner(), &start_balances, &transactions, block_size)?;
            println!("{line}");
        }
    }

    Ok(())
}
