// This is my entry point for the ledger simulation CLI
// Everything heavy lives in the library; here I only parse arguments, open storage
// and print results
use clap::Parser;
use log::{error, LevelFilter};
use std::path::PathBuf;
use std::process;
use vc_ledger::{
    export_chain_json, validate_address, BlockchainError, Command, DifficultyController, Opt,
    SimulationConfig, Simulator, Storage, Validator, DEFAULT_CONFIG_PATH,
};

fn main() {
    let opt = Opt::parse();

    // Info by default, debug with --verbose; RUST_LOG still wins when it is set
    let level = if opt.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

// I open the data directory given on the command line, or ./serialization_output
fn open_storage(data_dir: Option<PathBuf>) -> Result<Storage, BlockchainError> {
    let path = match data_dir {
        Some(path) => path,
        None => Storage::default_path()?,
    };
    Storage::open(path)
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        // When I want to run the whole simulation
        Command::Simulate {
            config,
            data_dir,
            miners,
            chain_size,
        } => {
            let config_path = config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
            let mut config = SimulationConfig::load(config_path)?.apply_env_overrides()?;
            // Command-line flags override both the file and the environment
            if let Some(miners) = miners {
                config.number_of_miners = miners;
            }
            if let Some(chain_size) = chain_size {
                config.assumed_blockchain_size = chain_size;
            }

            let simulator = Simulator::new(config, open_storage(data_dir)?);
            let report = simulator.run()?;
            println!("{report}");
        }
        Command::Printchain { data_dir } => {
            let storage = open_storage(data_dir)?;
            match storage.load_chain()? {
                Some(blocks) => {
                    for block in blocks {
                        println!("{block}\n");
                    }
                }
                None => println!("No chain stored yet"),
            }
        }
        // I write the same JSON format the simulator leaves next to its database
        Command::Export { data_dir, output } => {
            let storage = open_storage(data_dir)?;
            let blocks = storage.load_chain()?.unwrap_or_default();
            let json = export_chain_json(&blocks)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Exported {} blocks to {}", blocks.len(), path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Balance { address, data_dir } => {
            if !validate_address(&address) {
                return Err(BlockchainError::InvalidAddress(address).into());
            }
            let storage = open_storage(data_dir)?;
            let blocks = storage.load_chain()?.unwrap_or_default();
            let pending = storage.load_pool()?;
            let balance = Validator::coins_of(&address, &blocks, &pending)?;
            println!("Balance of {address}: {balance}");
        }
        Command::Verify { data_dir } => {
            let storage = open_storage(data_dir)?;
            let blocks = storage
                .load_chain()?
                .ok_or_else(|| BlockchainError::Database("No chain stored yet".to_string()))?;
            if Validator::verify_chain(&blocks, DifficultyController::get_initial_difficulty()) {
                println!("Chain of height {} is valid", blocks.len() - 1);
            } else {
                return Err(BlockchainError::InvalidBlock(
                    "Stored chain failed verification".to_string(),
                )
                .into());
            }
        }
        Command::Createwallet { name, data_dir } => {
            let storage = open_storage(data_dir)?;
            let mut wallets = storage.load_wallets()?;
            let address = wallets.create_wallet(&name)?;
            storage.save_wallets(&wallets)?;
            storage.flush()?;
            println!("Your new address: {address}")
        }
        Command::ListAddresses { data_dir } => {
            let storage = open_storage(data_dir)?;
            for (name, address) in storage.load_wallets()?.get_addresses() {
                println!("{name}: {address}")
            }
        }
    }
    Ok(())
}
