use crate::config::SimulationConfig;
use crate::error::Result;
use crate::wallet::{Wallet, Wallets};
use rand::seq::SliceRandom;
use rand::Rng;

/// A named wallet taking part in the simulation
#[derive(Clone)]
pub struct Participant {
    name: String,
    address: String,
    wallet: Wallet,
}

impl Participant {
    pub fn new(name: &str, wallet: Wallet) -> Participant {
        Participant {
            name: name.to_string(),
            address: wallet.get_address(),
            wallet,
        }
    }

    pub fn get_name(&self) -> &str {
        self.name.as_str()
    }

    pub fn get_address(&self) -> &str {
        self.address.as_str()
    }

    pub fn get_wallet(&self) -> &Wallet {
        &self.wallet
    }
}

/// Every miner and client of a run. Miners are named `Miner <i>` and clients
/// `Client <i>`; wallets survive between runs through `Wallets`.
pub struct Participants {
    miners: Vec<Participant>,
    clients: Vec<Participant>,
}

impl Participants {
    pub fn new(miners: Vec<Participant>, clients: Vec<Participant>) -> Participants {
        Participants { miners, clients }
    }

    /// Reuse the wallets already in `wallets` and create the missing ones
    pub fn from_config(config: &SimulationConfig, wallets: &mut Wallets) -> Result<Participants> {
        let mut miners = Vec::with_capacity(config.number_of_miners as usize);
        for i in 0..config.number_of_miners {
            let name = Self::miner_name(i);
            miners.push(Participant::new(&name, wallets.get_or_create(&name)?));
        }
        let mut clients = Vec::with_capacity(config.number_of_clients as usize);
        for i in 0..config.number_of_clients {
            let name = format!("Client {i}");
            clients.push(Participant::new(&name, wallets.get_or_create(&name)?));
        }
        Ok(Participants { miners, clients })
    }

    pub fn miner_name(index: u32) -> String {
        format!("Miner {index}")
    }

    pub fn get_miners(&self) -> &[Participant] {
        self.miners.as_slice()
    }

    pub fn get_clients(&self) -> &[Participant] {
        self.clients.as_slice()
    }

    pub fn all(&self) -> impl Iterator<Item = &Participant> {
        self.clients.iter().chain(self.miners.iter())
    }

    pub fn random_client<R: Rng>(&self, rng: &mut R) -> Option<&Participant> {
        self.clients.choose(rng)
    }

    /// Any client or miner other than the one with address `excluded`
    pub fn random_other<R: Rng>(&self, excluded: &str, rng: &mut R) -> Option<&Participant> {
        let others: Vec<&Participant> = self
            .all()
            .filter(|participant| participant.get_address() != excluded)
            .collect();
        others.choose(rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            number_of_miners: 2,
            number_of_clients: 3,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_from_config_names_participants() {
        let mut wallets = Wallets::new();
        let participants = Participants::from_config(&small_config(), &mut wallets).unwrap();
        assert_eq!(participants.get_miners().len(), 2);
        assert_eq!(participants.get_clients().len(), 3);
        assert_eq!(participants.get_miners()[1].get_name(), "Miner 1");
        assert_eq!(participants.get_clients()[0].get_name(), "Client 0");
        assert_eq!(wallets.len(), 5);
    }

    #[test]
    fn test_from_config_reuses_wallets() {
        let mut wallets = Wallets::new();
        let first = Participants::from_config(&small_config(), &mut wallets).unwrap();
        let second = Participants::from_config(&small_config(), &mut wallets).unwrap();
        assert_eq!(
            first.get_clients()[2].get_address(),
            second.get_clients()[2].get_address()
        );
    }

    #[test]
    fn test_random_other_never_returns_excluded() {
        let mut wallets = Wallets::new();
        let participants = Participants::from_config(&small_config(), &mut wallets).unwrap();
        let excluded = participants.get_miners()[0].get_address().to_string();
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let other = participants.random_other(&excluded, &mut rng).unwrap();
            assert_ne!(other.get_address(), excluded);
        }

        let lonely = Participants::new(vec![participants.get_miners()[0].clone()], vec![]);
        assert!(lonely.random_other(&excluded, &mut rng).is_none());
        assert!(lonely.random_client(&mut rng).is_none());
    }
}
