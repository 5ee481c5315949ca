//! Error types for the lottery runtime
//!
//! All fallible operations return `Result<T, Error>`.
//! Every variant leaves contract state and balances untouched.

use crate::types::{Address, Amount};

/// Lottery runtime error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Stake attached to `enter` does not exceed the minimum
    #[error("Insufficient stake: {stake} must be greater than {minimum}")]
    InsufficientStake { stake: Amount, minimum: Amount },

    /// Only the manager may settle a round
    #[error("Unauthorized: {caller} is not the lottery manager")]
    Unauthorized { caller: Address },

    /// `pick_winner` on an empty round
    #[error("No entrants: cannot pick a winner from an empty round")]
    NoEntrants,

    /// Address is not registered on the ledger
    #[error("Unknown account: {0}")]
    UnknownAccount(Address),

    /// Debit larger than the account's balance
    #[error("Insufficient funds in {account}: needed {needed}, available {available}")]
    InsufficientFunds {
        account: Address,
        needed: Amount,
        available: Amount,
    },

    /// Balance arithmetic overflowed
    #[error("Amount overflow")]
    AmountOverflow,

    /// Subtraction would go below zero
    #[error("Amount underflow")]
    AmountUnderflow,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Malformed scenario request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable variant name, used in JSON reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InsufficientStake { .. } => "InsufficientStake",
            Error::Unauthorized { .. } => "Unauthorized",
            Error::NoEntrants => "NoEntrants",
            Error::UnknownAccount(_) => "UnknownAccount",
            Error::InsufficientFunds { .. } => "InsufficientFunds",
            Error::AmountOverflow => "AmountOverflow",
            Error::AmountUnderflow => "AmountUnderflow",
            Error::InvalidAmount(_) => "InvalidAmount",
            Error::InvalidAddress(_) => "InvalidAddress",
            Error::InvalidRequest(_) => "InvalidRequest",
            Error::Config(_) => "Config",
        }
    }
}

/// Result type alias for lottery operations
pub type Result<T> = std::result::Result<T, Error>;
