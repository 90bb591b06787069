// A miner keeps building a candidate on top of whatever the ledger looks like right
// now, searches for a nonce and submits. Losing a race just means starting over
// from a fresh snapshot.

use crate::core::{Ledger, MinerReward, ProofOfWork, REWARD_VALUE};
use crate::error::Result;
use crate::simulation::{Participant, Participants, SimulationEvent, ShutdownFlag};
use crate::utils::current_timestamp;
use log::{debug, error, info};
use rand::Rng;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

// After an accepted block the miner pays someone with probability 3 out of 5
const PAYMENT_CHANCE: (u32, u32) = (3, 5);
const MAX_PAYMENT: u64 = 100;

pub struct Miner {
    id: u32,
    participant: Participant,
    ledger: Arc<Ledger>,
    participants: Arc<Participants>,
    target_height: u32,
    shutdown: ShutdownFlag,
    events: Sender<SimulationEvent>,
}

impl Miner {
    pub fn new(
        id: u32,
        participant: Participant,
        ledger: Arc<Ledger>,
        participants: Arc<Participants>,
        target_height: u32,
        shutdown: ShutdownFlag,
        events: Sender<SimulationEvent>,
    ) -> Miner {
        Miner {
            id,
            participant,
            ledger,
            participants,
            target_height,
            shutdown,
            events,
        }
    }

    /// Run the mining loop on its own thread. A fatal error is reported on the
    /// event channel and stops the whole simulation.
    pub fn spawn(self) -> JoinHandle<()> {
        thread::spawn(move || {
            if let Err(e) = self.run() {
                error!("Miner {} stopped: {e}", self.id);
                self.shutdown.trigger();
                let _ = self.events.send(SimulationEvent::Fatal(e));
            }
        })
    }

    /// Mine until the target height exists or shutdown is requested
    pub fn run(&self) -> Result<()> {
        let miner_name = self.id.to_string();
        while self.ledger.size() < self.target_height && !self.shutdown.is_triggered() {
            let (last, pending, difficulty) = self.ledger.snapshot();
            if last.get_height() >= self.target_height {
                break;
            }

            let reward = MinerReward::new(self.participant.get_address(), REWARD_VALUE);
            let pow =
                ProofOfWork::new_proof_of_work(&last, pending, &miner_name, reward, difficulty);
            let timestamp = current_timestamp()?;
            let shutdown = &self.shutdown;
            let block = match pow.run_until(timestamp, || shutdown.is_triggered()) {
                Some(block) => block,
                None => break,
            };

            let height = block.get_height();
            if !self.ledger.append(block) {
                continue;
            }
            debug!("Miner {} appended block {height}", self.id);
            self.prepare_transaction()?;

            if height == self.target_height {
                info!("Miner {} reached the target height {height}", self.id);
                let _ = self.events.send(SimulationEvent::TargetReached(height));
            }
        }
        Ok(())
    }

    // Simulated economic activity: now and then pay a random other participant
    fn prepare_transaction(&self) -> Result<()> {
        let mut rng = rand::thread_rng();
        if rng.gen_range(0..PAYMENT_CHANCE.1) >= PAYMENT_CHANCE.0 {
            return Ok(());
        }
        let amount = rng.gen_range(0..=MAX_PAYMENT);
        if let Some(receiver) = self
            .participants
            .random_other(self.participant.get_address(), &mut rng)
        {
            self.participant
                .get_wallet()
                .send(&self.ledger, receiver.get_address(), amount)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Validator;
    use crate::wallet::Wallet;
    use std::sync::mpsc::channel;

    fn create_miner(
        ledger: Arc<Ledger>,
        target_height: u32,
    ) -> (Miner, std::sync::mpsc::Receiver<SimulationEvent>, ShutdownFlag) {
        let participant = Participant::new(&Participants::miner_name(0), Wallet::new().unwrap());
        let other = Participant::new("Client 0", Wallet::new().unwrap());
        let participants = Arc::new(Participants::new(vec![participant.clone()], vec![other]));
        let shutdown = ShutdownFlag::new();
        let (sender, receiver) = channel();
        let miner = Miner::new(
            0,
            participant,
            ledger,
            participants,
            target_height,
            shutdown.clone(),
            sender,
        );
        (miner, receiver, shutdown)
    }

    #[test]
    fn test_miner_reaches_target() {
        let ledger = Arc::new(Ledger::with_difficulty(2));
        let (miner, events, _shutdown) = create_miner(Arc::clone(&ledger), 3);
        miner.run().unwrap();

        assert_eq!(ledger.size(), 3);
        assert!(matches!(
            events.try_recv(),
            Ok(SimulationEvent::TargetReached(3))
        ));
        assert!(Validator::verify_chain(&ledger.blocks(), 2));
        for block in ledger.blocks().iter().skip(1) {
            assert_eq!(block.get_miner_name(), "0");
        }
    }

    #[test]
    fn test_miner_stops_on_shutdown() {
        let ledger = Arc::new(Ledger::with_difficulty(2));
        let (miner, events, shutdown) = create_miner(Arc::clone(&ledger), 100);
        shutdown.trigger();
        miner.run().unwrap();

        assert_eq!(ledger.size(), 0);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_miner_idle_when_target_already_reached() {
        let ledger = Arc::new(Ledger::with_difficulty(2));
        let (miner, _events, _shutdown) = create_miner(Arc::clone(&ledger), 0);
        miner.run().unwrap();
        assert_eq!(ledger.size(), 0);
    }
}
