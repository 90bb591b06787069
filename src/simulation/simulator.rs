// The simulator owns the run: it restores the previous progress, starts one thread
// per miner plus the client activity thread, waits until the target height is
// reached and then stops everybody and saves what happened.

use crate::config::SimulationConfig;
use crate::core::Ledger;
use crate::error::{BlockchainError, Result};
use crate::simulation::{ClientActivity, Miner, Participants, ShutdownFlag};
use crate::storage::Storage;
use crate::wallet::Wallets;
use log::{error, info, warn};
use std::fmt;
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// What worker threads report back to the coordinator
#[derive(Debug, Clone)]
pub enum SimulationEvent {
    TargetReached(u32),
    Fatal(BlockchainError),
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub final_height: u32,
    pub difficulty: u32,
    pub pending_transactions: usize,
    pub balances: Vec<(String, String, i64)>, // (name, address, balance)
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Chain height: {}", self.final_height)?;
        writeln!(f, "Difficulty: {}", self.difficulty)?;
        write!(f, "Pending transactions: {}", self.pending_transactions)?;
        for (name, address, balance) in &self.balances {
            write!(f, "\n{name} ({address}): {balance}")?;
        }
        Ok(())
    }
}

pub struct Simulator {
    config: SimulationConfig,
    ledger: Arc<Ledger>,
    storage: Storage,
    shutdown: ShutdownFlag,
}

impl Simulator {
    pub fn new(config: SimulationConfig, storage: Storage) -> Simulator {
        Self::with_ledger(config, storage, Ledger::new())
    }

    /// Run on a prepared ledger, e.g. one with a lower starting difficulty
    pub fn with_ledger(config: SimulationConfig, storage: Storage, ledger: Ledger) -> Simulator {
        Simulator {
            config,
            ledger: Arc::new(ledger),
            storage,
            shutdown: ShutdownFlag::new(),
        }
    }

    pub fn get_ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Restore chain, pool and wallets from storage. Anything missing or unreadable
    /// is replaced by a fresh start.
    pub fn load_progress(&self) -> Wallets {
        let chain_restored = match self.storage.load_chain() {
            Ok(Some(blocks)) => {
                let strict = self.config.use_full_transactions_check_on_loading;
                let accepted = self.ledger.load(blocks, strict);
                if accepted {
                    info!("Loaded chain of height {}", self.ledger.size());
                }
                accepted
            }
            Ok(None) => {
                info!("No saved chain, starting from genesis");
                false
            }
            Err(e) => {
                warn!("Could not load saved chain, starting from genesis: {e}");
                false
            }
        };

        // The saved pool spends coins of the saved chain, so it only comes back with it
        if chain_restored {
            match self.storage.load_pool() {
                Ok(transactions) => self.ledger.load_pool(transactions),
                Err(e) => warn!("Could not load pending transactions: {e}"),
            }
        } else {
            warn!("Saved pending transactions are dropped along with the chain");
        }

        match self.storage.load_wallets() {
            Ok(wallets) => wallets,
            Err(e) => {
                warn!("Could not load wallets, creating new participants: {e}");
                Wallets::new()
            }
        }
    }

    pub fn save_progress(&self, wallets: &Wallets) -> Result<()> {
        let blocks = self.ledger.blocks();
        self.storage.save_chain(&blocks)?;
        self.storage.save_pool(&self.ledger.pending_transactions())?;
        self.storage.save_wallets(wallets)?;
        self.storage.flush()?;
        let export_path = self.storage.write_export(&blocks)?;
        info!("Chain exported to {}", export_path.display());
        Ok(())
    }

    /// Run until the target height is on chain, then save and report. A fatal
    /// error from any worker stops the run and is returned without saving.
    pub fn run(&self) -> Result<SimulationReport> {
        self.config.validate()?;
        let mut wallets = self.load_progress();
        let participants = Arc::new(Participants::from_config(&self.config, &mut wallets)?);

        let target = self.config.assumed_blockchain_size;
        let mut fatal = None;
        if self.ledger.size() >= target {
            info!(
                "Chain already has {} blocks, target is {target}",
                self.ledger.size()
            );
        } else {
            fatal = self.mine_until_target(&participants);
        }

        if let Some(e) = fatal {
            error!("Simulation aborted: {e}");
            return Err(e);
        }

        self.save_progress(&wallets)?;
        self.report(&participants)
    }

    fn mine_until_target(&self, participants: &Arc<Participants>) -> Option<BlockchainError> {
        let (sender, receiver) = channel();
        let mut handles = self.spawn_miners(participants, &sender);
        if let Some(handle) = self.spawn_client_activity(participants, &sender) {
            handles.push(handle);
        }
        // Only workers hold senders now, so recv fails once they are all gone
        drop(sender);

        let mut fatal = None;
        match receiver.recv() {
            Ok(SimulationEvent::TargetReached(height)) => {
                info!("Target height {height} reached, stopping workers");
            }
            Ok(SimulationEvent::Fatal(e)) => fatal = Some(e),
            Err(_) => warn!("All workers stopped before the target height was reached"),
        }

        self.shutdown.trigger();
        for handle in handles {
            if handle.join().is_err() {
                error!("A worker thread panicked");
            }
        }
        // A fatal error may have been reported while the others were winding down
        while let Ok(event) = receiver.try_recv() {
            if let SimulationEvent::Fatal(e) = event {
                fatal.get_or_insert(e);
            }
        }
        fatal
    }

    fn spawn_miners(
        &self,
        participants: &Arc<Participants>,
        sender: &Sender<SimulationEvent>,
    ) -> Vec<JoinHandle<()>> {
        participants
            .get_miners()
            .iter()
            .enumerate()
            .map(|(id, participant)| {
                Miner::new(
                    id as u32,
                    participant.clone(),
                    Arc::clone(&self.ledger),
                    Arc::clone(participants),
                    self.config.assumed_blockchain_size,
                    self.shutdown.clone(),
                    sender.clone(),
                )
                .spawn()
            })
            .collect()
    }

    fn spawn_client_activity(
        &self,
        participants: &Arc<Participants>,
        sender: &Sender<SimulationEvent>,
    ) -> Option<JoinHandle<()>> {
        if participants.get_clients().is_empty() {
            return None;
        }
        let activity = ClientActivity::new(
            Arc::clone(&self.ledger),
            Arc::clone(participants),
            Duration::from_millis(self.config.initial_clients_delay),
            Duration::from_millis(self.config.clients_transactions_delay),
            self.shutdown.clone(),
            sender.clone(),
        );
        Some(activity.spawn())
    }

    fn report(&self, participants: &Participants) -> Result<SimulationReport> {
        let mut balances = vec![];
        for participant in participants.all() {
            balances.push((
                participant.get_name().to_string(),
                participant.get_address().to_string(),
                self.ledger.coins_of(participant.get_address())?,
            ));
        }
        Ok(SimulationReport {
            final_height: self.ledger.size(),
            difficulty: self.ledger.current_difficulty(),
            pending_transactions: self.ledger.pending_transactions().len(),
            balances,
        })
    }
}
