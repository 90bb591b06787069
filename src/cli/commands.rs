use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "vc-ledger", about = "Proof-of-work ledger simulation")]
pub struct Opt {
    #[arg(short, long, global = true, help = "Log debug output")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "simulate", about = "Run miners and clients until the target height")]
    Simulate {
        #[arg(long, help = "Configuration file (JSON, or TOML with a .toml extension)")]
        config: Option<PathBuf>,
        #[arg(long = "data-dir", help = "Directory holding saved progress")]
        data_dir: Option<PathBuf>,
        #[arg(long, help = "Override the number of miners")]
        miners: Option<u32>,
        #[arg(long = "chain-size", help = "Override the target chain height")]
        chain_size: Option<u32>,
    },
    #[command(name = "printchain", about = "Print all stored blocks")]
    Printchain {
        #[arg(long = "data-dir")]
        data_dir: Option<PathBuf>,
    },
    #[command(name = "export", about = "Write the stored chain as JSON")]
    Export {
        #[arg(long = "data-dir")]
        data_dir: Option<PathBuf>,
        #[arg(long, help = "Output file, stdout if omitted")]
        output: Option<PathBuf>,
    },
    #[command(name = "balance", about = "Balance of an address over the stored chain and pool")]
    Balance {
        #[arg(help = "The wallet address")]
        address: String,
        #[arg(long = "data-dir")]
        data_dir: Option<PathBuf>,
    },
    #[command(name = "verify", about = "Fully re-verify the stored chain")]
    Verify {
        #[arg(long = "data-dir")]
        data_dir: Option<PathBuf>,
    },
    #[command(name = "createwallet", about = "Create a new named wallet")]
    Createwallet {
        #[arg(help = "Participant name, e.g. \"Client 7\"")]
        name: String,
        #[arg(long = "data-dir")]
        data_dir: Option<PathBuf>,
    },
    #[command(name = "listaddresses", about = "Print stored wallet names and addresses")]
    ListAddresses {
        #[arg(long = "data-dir")]
        data_dir: Option<PathBuf>,
    },
}
