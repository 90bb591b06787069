use crate::core::Ledger;
use crate::error::Result;
use crate::simulation::{Participants, ShutdownFlag, SimulationEvent};
use log::error;
use rand::Rng;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Background load generator: at a fixed delay a random client with a positive
/// balance pays roughly up to a quarter of it to someone else.
pub struct ClientActivity {
    ledger: Arc<Ledger>,
    participants: Arc<Participants>,
    initial_delay: Duration,
    delay: Duration,
    shutdown: ShutdownFlag,
    events: Sender<SimulationEvent>,
}

impl ClientActivity {
    pub fn new(
        ledger: Arc<Ledger>,
        participants: Arc<Participants>,
        initial_delay: Duration,
        delay: Duration,
        shutdown: ShutdownFlag,
        events: Sender<SimulationEvent>,
    ) -> ClientActivity {
        ClientActivity {
            ledger,
            participants,
            initial_delay,
            delay,
            shutdown,
            events,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        thread::spawn(move || {
            if let Err(e) = self.run() {
                error!("Client activity stopped: {e}");
                self.shutdown.trigger();
                let _ = self.events.send(SimulationEvent::Fatal(e));
            }
        })
    }

    /// Fire `tick` after the initial delay and then after every delay until shutdown
    pub fn run(&self) -> Result<()> {
        if self.shutdown.sleep(self.initial_delay) {
            return Ok(());
        }
        loop {
            self.tick()?;
            if self.shutdown.sleep(self.delay) {
                return Ok(());
            }
        }
    }

    /// One round of activity. Returns whether a transaction was accepted.
    pub fn tick(&self) -> Result<bool> {
        let mut rng = rand::thread_rng();
        let sender = match self.participants.random_client(&mut rng) {
            Some(sender) => sender,
            None => return Ok(false),
        };

        let balance = self.ledger.coins_of(sender.get_address())?;
        if balance <= 0 {
            return Ok(false);
        }
        let amount = Self::amount_for(balance, &mut rng);

        let receiver = match self
            .participants
            .random_other(sender.get_address(), &mut rng)
        {
            Some(receiver) => receiver,
            None => return Ok(false),
        };
        sender
            .get_wallet()
            .send(&self.ledger, receiver.get_address(), amount)
    }

    /// `max(1, random below balance / 4)`
    pub fn amount_for<R: Rng>(balance: i64, rng: &mut R) -> u64 {
        let quarter = (balance / 4).max(0) as u64;
        let drawn = if quarter > 0 {
            rng.gen_range(0..quarter)
        } else {
            0
        };
        drawn.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Participant;
    use crate::testnet::mine_next;
    use crate::wallet::Wallet;
    use std::sync::mpsc::channel;

    fn create_activity(ledger: Arc<Ledger>) -> (ClientActivity, Participant) {
        let client = Participant::new("Client 0", Wallet::new().unwrap());
        let miner = Participant::new("Miner 0", Wallet::new().unwrap());
        let participants = Arc::new(Participants::new(vec![miner], vec![client.clone()]));
        let (sender, _receiver) = channel();
        let activity = ClientActivity::new(
            ledger,
            participants,
            Duration::from_millis(0),
            Duration::from_millis(1),
            ShutdownFlag::new(),
            sender,
        );
        (activity, client)
    }

    #[test]
    fn test_amount_for() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let amount = ClientActivity::amount_for(100, &mut rng);
            assert!((1..25).contains(&amount));
        }
        assert_eq!(ClientActivity::amount_for(3, &mut rng), 1);
        assert_eq!(ClientActivity::amount_for(1, &mut rng), 1);
    }

    #[test]
    fn test_tick_without_funds_does_nothing() {
        let ledger = Arc::new(Ledger::with_difficulty(2));
        let (activity, _client) = create_activity(Arc::clone(&ledger));
        assert!(!activity.tick().unwrap());
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn test_tick_sends_from_funded_client() {
        let ledger = Arc::new(Ledger::with_difficulty(2));
        let (activity, client) = create_activity(Arc::clone(&ledger));
        assert!(ledger.append(mine_next(&ledger, client.get_address())));

        assert!(activity.tick().unwrap());
        let pending = ledger.pending_transactions();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].get_sender(), client.get_address());
        assert!(pending[0].get_amount() >= 1 && pending[0].get_amount() < 25);
    }

    #[test]
    fn test_run_returns_after_shutdown() {
        let ledger = Arc::new(Ledger::with_difficulty(2));
        let (activity, _client) = create_activity(ledger);
        activity.shutdown.trigger();
        activity.run().unwrap();
    }
}
