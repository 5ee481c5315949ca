//! Ledger boundary and the in-memory chain that implements it
//!
//! The lottery never holds funds or draws randomness itself. It talks to a
//! [`LedgerService`] for the caller identity, the value attached to the call,
//! custody of the pooled stakes, payouts, and entropy.
//!
//! [`InMemoryLedger`] is a local development chain: deterministic funded
//! accounts, contract deployment, and all-or-nothing transactions. Each
//! transaction runs against a [`CallFrame`], the `LedgerService` view of one
//! in-flight call.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::LedgerConfig;
use crate::types::{Address, Amount};
use crate::{Error, Result};

/// What a contract may ask of the ledger during one call
pub trait LedgerService {
    /// Account that submitted the current call
    fn current_caller(&self) -> Address;

    /// Value attached to the current call, already held in custody
    fn attached_value(&self) -> Amount;

    /// Total balance held on behalf of the executing contract
    fn balance(&self) -> Amount;

    /// Pay `amount` out of the contract's custody to `to`
    fn transfer(&mut self, to: Address, amount: Amount) -> Result<()>;

    /// Uniform index in `[0, bound)`; `bound` must be non-zero
    fn random_index(&mut self, bound: usize) -> usize;
}

// ── In-Memory Ledger ──────────────────────────────────────

/// Local chain holding balances, nonces and an entropy source
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    /// Externally owned accounts, in derivation order
    accounts: Vec<Address>,
    /// Balances of accounts and deployed contracts
    balances: BTreeMap<Address, Amount>,
    /// Transaction counts, used to derive contract addresses
    nonces: BTreeMap<Address, u64>,
    /// One block is mined per transaction
    block_number: u64,
    rng: ChaCha8Rng,
}

impl InMemoryLedger {
    /// Derive and fund the configured accounts
    pub fn new(config: &LedgerConfig) -> Self {
        let accounts: Vec<Address> = (0..config.accounts)
            .map(|i| Address::derive(format!("{}/{}", config.seed_phrase, i).as_bytes()))
            .collect();
        let balances = accounts
            .iter()
            .map(|a| (*a, config.initial_balance))
            .collect();
        let nonces = accounts.iter().map(|a| (*a, 0)).collect();
        let seed = config
            .rng_seed
            .unwrap_or_else(|| rand::thread_rng().gen::<u64>());

        InMemoryLedger {
            accounts,
            balances,
            nonces,
            block_number: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    /// Account at `index` in derivation order
    pub fn account(&self, index: usize) -> Result<Address> {
        self.accounts.get(index).copied().ok_or_else(|| {
            Error::InvalidRequest(format!(
                "account index {} out of range ({} accounts)",
                index,
                self.accounts.len()
            ))
        })
    }

    /// Balance of an account or contract; unknown addresses hold nothing
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or_default()
    }

    pub fn nonce_of(&self, address: &Address) -> u64 {
        self.nonces.get(address).copied().unwrap_or_default()
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// Every known address with its balance
    pub fn balances(&self) -> &BTreeMap<Address, Amount> {
        &self.balances
    }

    /// Deploy a contract from `deployer`, running `init` as its constructor.
    ///
    /// The address is derived from the deployer and its nonce, so repeated
    /// deployments by one account get distinct addresses. A failing
    /// constructor leaves no contract behind.
    pub fn deploy<T, F>(&mut self, deployer: Address, init: F) -> Result<(Address, T)>
    where
        F: FnOnce(&mut CallFrame<'_>) -> Result<T>,
    {
        let nonce = self.known_nonce(&deployer)?;
        let mut seed = deployer.as_bytes().to_vec();
        seed.extend_from_slice(&nonce.to_be_bytes());
        let contract = Address::derive(&seed);

        self.balances.insert(contract, Amount::ZERO);
        self.nonces.insert(deployer, nonce + 1);
        self.block_number += 1;

        let mut frame = CallFrame {
            ledger: &mut *self,
            caller: deployer,
            contract,
            value: Amount::ZERO,
        };
        match init(&mut frame) {
            Ok(instance) => {
                debug!(%deployer, %contract, "contract deployed");
                Ok((contract, instance))
            }
            Err(e) => {
                self.balances.remove(&contract);
                Err(e)
            }
        }
    }

    /// Run `call` as one all-or-nothing transaction.
    ///
    /// `value` moves from `caller` into `contract`'s custody before `call`
    /// runs. If `call` fails, every balance is restored; the caller's nonce
    /// still advances, as for a mined transaction that reverted.
    pub fn transact<T, F>(
        &mut self,
        caller: Address,
        contract: Address,
        value: Amount,
        call: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut CallFrame<'_>) -> Result<T>,
    {
        let nonce = self.known_nonce(&caller)?;
        if !self.balances.contains_key(&contract) {
            return Err(Error::UnknownAccount(contract));
        }

        let snapshot = self.balances.clone();
        self.nonces.insert(caller, nonce + 1);
        self.block_number += 1;

        let outcome = match self.move_funds(caller, contract, value) {
            Ok(()) => {
                let mut frame = CallFrame {
                    ledger: &mut *self,
                    caller,
                    contract,
                    value,
                };
                call(&mut frame)
            }
            Err(e) => Err(e),
        };

        if let Err(ref e) = outcome {
            debug!(%caller, %contract, error = %e, "transaction reverted");
            self.balances = snapshot;
        }
        outcome
    }

    fn known_nonce(&self, account: &Address) -> Result<u64> {
        if !self.accounts.contains(account) {
            return Err(Error::UnknownAccount(*account));
        }
        Ok(self.nonce_of(account))
    }

    fn move_funds(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        let available = self.balance_of(&from);
        if available < amount {
            return Err(Error::InsufficientFunds {
                account: from,
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self.balance_of(&to).checked_add(amount)?;
        self.balances.insert(from, available.checked_sub(amount)?);
        self.balances.insert(to, credited);
        Ok(())
    }
}

// ── Call Frame ────────────────────────────────────────────

/// One in-flight call: the ledger as seen by the executing contract
pub struct CallFrame<'a> {
    ledger: &'a mut InMemoryLedger,
    caller: Address,
    contract: Address,
    value: Amount,
}

impl LedgerService for CallFrame<'_> {
    fn current_caller(&self) -> Address {
        self.caller
    }

    fn attached_value(&self) -> Amount {
        self.value
    }

    fn balance(&self) -> Amount {
        self.ledger.balance_of(&self.contract)
    }

    fn transfer(&mut self, to: Address, amount: Amount) -> Result<()> {
        self.ledger.move_funds(self.contract, to, amount)
    }

    /// Panics in debug builds when `bound` is zero; release builds return 0.
    fn random_index(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0, "random_index needs a non-empty range");
        if bound == 0 {
            return 0;
        }
        self.ledger.rng.gen_range(0..bound)
    }
}
