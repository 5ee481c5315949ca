//! Lottery Core - contract state machine and local chain simulator
//!
//! A lottery contract collects stakes from entrants and, when its manager
//! asks, pays the whole pool to one uniformly chosen entrant and starts a new
//! round. The contract never touches funds or entropy directly; it goes
//! through the [`LedgerService`] boundary.
//!
//! # Architecture
//!
//! ```text
//! Scenario JSON → Executor ──lock──→ InMemoryLedger::transact
//!                                          ↓
//!                                      CallFrame (LedgerService)
//!                                          ↓
//!                                      LotteryState::enter / pick_winner
//! ```
//!
//! # Guarantees
//!
//! - **Atomic**: a failed action changes no entrants and no balances
//! - **Serialized**: actions on one executor never interleave
//! - **Strict threshold**: a stake must be greater than the minimum, not equal
//! - **Reproducible**: a fixed `rng_seed` replays the same winners

pub mod config;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod lottery;
pub mod types;

pub use config::{Config, LedgerConfig, LotteryConfig, DEFAULT_MINIMUM_STAKE};
pub use error::{Error, Result};
pub use executor::{
    parse_requests, run_scenario, Executor, Receipt, ReceiptLog, Request, ScenarioReport,
};
pub use ledger::{CallFrame, InMemoryLedger, LedgerService};
pub use lottery::{LotteryState, Settlement};
pub use types::{Address, Amount};
