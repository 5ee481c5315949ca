//! The lottery contract — entrants, manager, and round settlement
//!
//! A round is open from deployment (or the previous payout) until the
//! manager calls [`LotteryState::pick_winner`]. Settlement pays the whole
//! pooled balance to one uniformly chosen entrant and empties the round in
//! the same call, so there is no closed state to recover from.
//!
//! Checks run before any mutation: a rejected call leaves the entrants and
//! the manager exactly as they were.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ledger::LedgerService;
use crate::types::{Address, Amount};
use crate::{Error, Result};

/// Contract state for one lottery instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryState {
    /// Fixed at construction
    manager: Address,
    /// Entry order; an account appears once per entry
    players: Vec<Address>,
    /// Stakes must be strictly greater than this
    minimum_stake: Amount,
}

/// Outcome of a settled round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub winner: Address,
    pub prize: Amount,
    /// Number of entries in the settled round
    pub entrants: usize,
}

impl LotteryState {
    pub fn new(manager: Address, minimum_stake: Amount) -> Self {
        LotteryState {
            manager,
            players: Vec::new(),
            minimum_stake,
        }
    }

    /// Constructor call: the deploying account becomes the manager
    pub fn deploy(ledger: &dyn LedgerService, minimum_stake: Amount) -> Self {
        Self::new(ledger.current_caller(), minimum_stake)
    }

    /// Add the caller to the current round.
    ///
    /// # Errors
    /// `InsufficientStake` unless the attached value exceeds the minimum.
    pub fn enter(&mut self, ledger: &mut dyn LedgerService) -> Result<()> {
        let caller = ledger.current_caller();
        let stake = ledger.attached_value();
        if stake <= self.minimum_stake {
            debug!(%caller, %stake, minimum = %self.minimum_stake, "entry rejected");
            return Err(Error::InsufficientStake {
                stake,
                minimum: self.minimum_stake,
            });
        }

        self.players.push(caller);
        debug!(%caller, %stake, players = self.players.len(), "entered");
        Ok(())
    }

    /// Pay the pooled balance to a random entrant and start a new round.
    ///
    /// # Errors
    /// - `Unauthorized` when the caller is not the manager
    /// - `NoEntrants` when nobody has entered this round
    /// - any error from the payout transfer; the round is kept in that case
    pub fn pick_winner(&mut self, ledger: &mut dyn LedgerService) -> Result<Settlement> {
        let caller = ledger.current_caller();
        if caller != self.manager {
            return Err(Error::Unauthorized { caller });
        }
        if self.players.is_empty() {
            return Err(Error::NoEntrants);
        }

        let index = ledger.random_index(self.players.len());
        let winner = self.players[index];
        let prize = ledger.balance();
        ledger.transfer(winner, prize)?;

        let entrants = self.players.len();
        self.players.clear();
        info!(%winner, %prize, entrants, "round settled");

        Ok(Settlement {
            winner,
            prize,
            entrants,
        })
    }

    /// Entrants of the current round, in entry order
    pub fn players(&self) -> &[Address] {
        &self.players
    }

    pub fn manager(&self) -> Address {
        self.manager
    }

    pub fn minimum_stake(&self) -> Amount {
        self.minimum_stake
    }
}
