use crate::core::Address;
use crate::storage::DEFAULT_STORE_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// Starting balance given on the command line as `ADDRESS=AMOUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceArg {
    pub address: Address,
    pub amount: u64,
}

impl FromStr for BalanceArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid balance: {s}. Expected ADDRESS=AMOUNT (e.g., '0=100')");
        let (address, amount) = s.split_once('=').ok_or_else(invalid)?;
        let address: Address = address.trim().parse().map_err(|_| invalid())?;
        let amount: u64 = amount.trim().parse().map_err(|_| invalid())?;
        if address < 0 {
            return Err(invalid());
        }
        Ok(BalanceArg { address, amount })
    }
}

#[derive(Debug, Parser)]
#[command(name = "tally-chain", about = "Single-node proof-of-work ledger")]
pub struct Opt {
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_STORE_FILE,
        help = "Ledger snapshot file"
    )]
    pub store: PathBuf,
    #[arg(long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "init", about = "Create a new ledger with starting balances")]
    Init {
        #[arg(
            long = "balance",
            help = "Starting balance as ADDRESS=AMOUNT, repeatable"
        )]
        balances: Vec<BalanceArg>,
        #[arg(long, help = "Overwrite an existing snapshot")]
        force: bool,
    },
    #[command(name = "status", about = "Show chain statistics")]
    Status,
    #[command(name = "balance", about = "Get the balance of an address")]
    Balance {
        #[arg(help = "Account address")]
        address: Address,
    },
    #[command(name = "send", about = "Queue a transfer in the pending pool")]
    Send {
        #[arg(help = "Source address")]
        from: Address,
        #[arg(help = "Destination address")]
        to: Address,
        #[arg(help = "Amount to send")]
        amount: u64,
        #[arg(long, default_value_t = 0, help = "Fee paid by the sender")]
        fee: u64,
    },
    #[command(name = "mine", about = "Seal pending transactions into blocks")]
    Mine {
        #[arg(long, default_value_t = 10, help = "Transfers per block")]
        block_size: usize,
        #[arg(long, help = "Address credited with the mining reward")]
        reward_address: Option<Address>,
        #[arg(long, help = "Worker threads for the nonce search")]
        workers: Option<usize>,
        #[arg(long, help = "Nonce ceiling")]
        max_nonce: Option<u64>,
        #[arg(long, help = "Seal the whole pool instead of a single block")]
        all: bool,
    },
    #[command(name = "history", about = "List sealed transactions of an address")]
    History {
        #[arg(help = "Account address")]
        address: Address,
    },
    #[command(name = "show-block", about = "Print one block")]
    ShowBlock {
        #[arg(help = "Block index")]
        index: usize,
    },
    #[command(name = "validate", about = "Re-check hashes, links and balances")]
    Validate,
    #[command(
        name = "legacy",
        about = "Run the legacy text protocol and print the last block line"
    )]
    Legacy {
        #[arg(help = "Start balances as a JSON list, e.g. '[5,0,0]'")]
        start_balances: String,
        #[arg(help = "Transactions as a JSON list of triples, e.g. '[[0,1,5]]'")]
        transactions: String,
        #[arg(help = "Transfers per block")]
        block_size: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_arg() {
        let arg: BalanceArg = "3=40".parse().unwrap();
        assert_eq!(
            arg,
            BalanceArg {
                address: 3,
                amount: 40
            }
        );
        assert!("3".parse::<BalanceArg>().is_err());
        assert!("-2=5".parse::<BalanceArg>().is_err());
        assert!("a=5".parse::<BalanceArg>().is_err());
    }

    #[test]
    fn test_parse_mine() {
        let opt = Opt::try_parse_from([
            "tally-chain",
            "--store",
            "chain.json",
            "mine",
            "--block-size",
            "3",
            "--workers",
            "4",
            "--all",
        ])
        .unwrap();

        assert_eq!(opt.store, PathBuf::from("chain.json"));
        match opt.command {
            Command::Mine {
                block_size,
                workers,
                all,
                reward_address,
                ..
            } => {
                assert_eq!(block_size, 3);
                assert_eq!(workers, Some(4));
                assert!(all);
                assert_eq!(reward_address, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_init_balances() {
        let opt =
            Opt::try_parse_from(["tally-chain", "init", "--balance", "0=5", "--balance", "1=7"])
                .unwrap();
        match opt.command {
            Command::Init { balances, force } => {
                assert_eq!(balances.len(), 2);
                assert!(!force);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
