//! Transaction executor — one deployed lottery on one in-memory chain
//!
//! The executor owns the ledger and the contract state behind a single
//! exclusive lock. Each submitted action holds the lock for its whole
//! duration, so `enter` and `pick_winner` never interleave, and each runs as
//! one all-or-nothing ledger transaction.
//!
//! # Receipts
//!
//! Every submitted action is appended to a receipt log, including actions
//! that failed. A failed receipt shows identical before/after players and
//! contract balance.
//!
//! # Scenarios
//!
//! [`run_scenario`] deploys a fresh lottery and runs a JSON list of
//! requests against it, stopping at the first failure:
//!
//! ```text
//! [
//!   { "action": "enter", "from": 1, "value": "0.02 ether" },
//!   { "action": "pickWinner", "from": 0 },
//!   { "action": "getPlayers" }
//! ]
//! ```

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::ledger::{CallFrame, InMemoryLedger};
use crate::lottery::{LotteryState, Settlement};
use crate::types::{Address, Amount};
use crate::{Error, Result};

// ── Receipts ──────────────────────────────────────────────

/// State-changing actions a caller can submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Enter,
    PickWinner,
}

/// Record of one submitted action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Sequential receipt number (0-indexed)
    pub sequence: u64,
    /// Chain height after the action
    pub block: u64,
    pub action: Action,
    pub from: Address,
    pub value: Amount,
    pub success: bool,
    pub error: Option<String>,
    pub players_before: Vec<Address>,
    pub players_after: Vec<Address>,
    pub contract_balance_before: Amount,
    pub contract_balance_after: Amount,
    /// Set when a round was settled
    pub winner: Option<Address>,
}

/// Append-only receipt log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLog {
    pub entries: Vec<Receipt>,
}

impl ReceiptLog {
    pub fn new() -> Self {
        ReceiptLog {
            entries: Vec::new(),
        }
    }

    pub fn append(&mut self, entry: Receipt) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ReceiptLog {
    fn default() -> Self {
        Self::new()
    }
}

// ── Executor ──────────────────────────────────────────────

/// Everything guarded by the executor's lock
struct Chain {
    ledger: InMemoryLedger,
    lottery: LotteryState,
    receipts: ReceiptLog,
}

impl Chain {
    /// Run one action as a ledger transaction and record its receipt.
    ///
    /// `call` returns the action's output plus the winner, if any.
    fn submit<T, F>(
        &mut self,
        contract: Address,
        action: Action,
        from: Address,
        value: Amount,
        call: F,
    ) -> (Receipt, Result<T>)
    where
        F: FnOnce(&mut LotteryState, &mut CallFrame<'_>) -> Result<(T, Option<Address>)>,
    {
        let players_before = self.lottery.players().to_vec();
        let contract_balance_before = self.ledger.balance_of(&contract);

        let lottery = &mut self.lottery;
        let outcome = self
            .ledger
            .transact(from, contract, value, |frame| call(lottery, frame));

        let (result, winner) = match outcome {
            Ok((output, winner)) => (Ok(output), winner),
            Err(e) => {
                warn!(?action, %from, error = %e, "action failed");
                (Err(e), None)
            }
        };

        let receipt = Receipt {
            sequence: self.receipts.len() as u64,
            block: self.ledger.block_number(),
            action,
            from,
            value,
            success: result.is_ok(),
            error: result.as_ref().err().map(|e| e.to_string()),
            players_before,
            players_after: self.lottery.players().to_vec(),
            contract_balance_before,
            contract_balance_after: self.ledger.balance_of(&contract),
            winner,
        };
        self.receipts.append(receipt.clone());
        (receipt, result)
    }
}

/// A deployed lottery and the chain it lives on
pub struct Executor {
    contract: Address,
    chain: Mutex<Chain>,
}

impl Executor {
    /// Build a fresh chain and deploy the lottery from the configured account
    pub fn deploy(config: &Config) -> Result<Self> {
        config.validate()?;
        let mut ledger = InMemoryLedger::new(&config.ledger);
        let deployer = ledger.account(config.ledger.deployer)?;
        let minimum_stake = config.lottery.minimum_stake;
        let (contract, lottery) = ledger.deploy(deployer, |frame| {
            Ok(LotteryState::deploy(&*frame, minimum_stake))
        })?;
        info!(%contract, manager = %deployer, %minimum_stake, "lottery deployed");

        Ok(Executor {
            contract,
            chain: Mutex::new(Chain {
                ledger,
                lottery,
                receipts: ReceiptLog::new(),
            }),
        })
    }

    /// Enter `from` into the current round with `value` attached
    pub fn enter(&self, from: Address, value: Amount) -> Result<Receipt> {
        let mut chain = self.chain.lock();
        let (receipt, result) =
            chain.submit(self.contract, Action::Enter, from, value, |lottery, frame| {
                lottery.enter(frame).map(|()| ((), None))
            });
        result.map(|()| receipt)
    }

    /// Settle the round; only the manager may call this
    pub fn pick_winner(&self, from: Address) -> Result<Settlement> {
        let mut chain = self.chain.lock();
        let (_, result) = chain.submit(
            self.contract,
            Action::PickWinner,
            from,
            Amount::ZERO,
            |lottery, frame| {
                let settlement = lottery.pick_winner(frame)?;
                let winner = settlement.winner;
                Ok((settlement, Some(winner)))
            },
        );
        result
    }

    /// Entrants of the current round, in entry order
    pub fn get_players(&self) -> Vec<Address> {
        self.chain.lock().lottery.players().to_vec()
    }

    pub fn get_manager(&self) -> Address {
        self.chain.lock().lottery.manager()
    }

    pub fn minimum_stake(&self) -> Amount {
        self.chain.lock().lottery.minimum_stake()
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    /// Balance the ledger holds for the lottery
    pub fn contract_balance(&self) -> Amount {
        self.chain.lock().ledger.balance_of(&self.contract)
    }

    pub fn balance_of(&self, address: &Address) -> Amount {
        self.chain.lock().ledger.balance_of(address)
    }

    pub fn accounts(&self) -> Vec<Address> {
        self.chain.lock().ledger.accounts().to_vec()
    }

    /// Account at `index` in derivation order
    pub fn account(&self, index: usize) -> Result<Address> {
        self.chain.lock().ledger.account(index)
    }

    pub fn receipts(&self) -> ReceiptLog {
        self.chain.lock().receipts.clone()
    }

    /// Run one scenario request; failures are reported in the result
    pub fn execute(&self, request: &Request) -> RequestResult {
        let action = request.name();
        let mut result = RequestResult::new(action);

        let outcome = match request {
            Request::Enter { from, value } => self.resolve(from).and_then(|from| {
                result.from = Some(from);
                self.enter(from, *value).map(|_| ())
            }),
            Request::PickWinner { from } => self.resolve(from).and_then(|from| {
                result.from = Some(from);
                self.pick_winner(from).map(|settlement| {
                    result.winner = Some(settlement.winner);
                    result.prize = Some(settlement.prize);
                })
            }),
            Request::GetPlayers => {
                result.players = Some(self.get_players());
                Ok(())
            }
            Request::GetManager => {
                result.manager = Some(self.get_manager());
                Ok(())
            }
        };

        if let Err(e) = outcome {
            result.success = false;
            result.error_kind = Some(e.kind().to_string());
            result.error = Some(e.to_string());
        }
        result
    }

    /// Run requests in order, stopping after the first failure
    pub fn run(&self, requests: &[Request]) -> ScenarioReport {
        let mut results = Vec::new();
        let mut error = None;

        for request in requests {
            let result = self.execute(request);
            let failed = !result.success;
            if failed {
                error = result.error.clone();
            }
            results.push(result);
            if failed {
                break;
            }
        }

        let chain = self.chain.lock();
        let balances = chain
            .ledger
            .accounts()
            .iter()
            .map(|a| (*a, chain.ledger.balance_of(a)))
            .collect();

        ScenarioReport {
            contract: self.contract,
            manager: chain.lottery.manager(),
            success: error.is_none(),
            results,
            players: chain.lottery.players().to_vec(),
            contract_balance: chain.ledger.balance_of(&self.contract),
            balances,
            receipts: chain.receipts.clone(),
            error,
        }
    }

    fn resolve(&self, caller: &Caller) -> Result<Address> {
        match caller {
            Caller::Index(index) => self.account(*index),
            Caller::Address(address) => Ok(*address),
        }
    }
}

// ── Scenario Requests ─────────────────────────────────────

/// Account reference in a request: derivation index or address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Caller {
    Index(usize),
    Address(Address),
}

/// One scenario step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    Enter { from: Caller, value: Amount },
    PickWinner { from: Caller },
    GetPlayers,
    GetManager,
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Enter { .. } => "enter",
            Request::PickWinner { .. } => "pickWinner",
            Request::GetPlayers => "getPlayers",
            Request::GetManager => "getManager",
        }
    }
}

/// Outcome of one scenario step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestResult {
    pub action: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<Address>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequestResult {
    fn new(action: &str) -> Self {
        RequestResult {
            action: action.to_string(),
            success: true,
            from: None,
            players: None,
            manager: None,
            winner: None,
            prize: None,
            error_kind: None,
            error: None,
        }
    }
}

/// Result of a full scenario run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub contract: Address,
    pub manager: Address,
    pub success: bool,
    pub results: Vec<RequestResult>,
    /// Entrants after the last executed step
    pub players: Vec<Address>,
    pub contract_balance: Amount,
    /// Account balances after the run
    pub balances: BTreeMap<Address, Amount>,
    pub receipts: ReceiptLog,
    pub error: Option<String>,
}

/// Parse scenario JSON: a single request object or an array of them
pub fn parse_requests(input: &str) -> Result<Vec<Request>> {
    let trimmed = input.trim();
    if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)
            .map_err(|e| Error::InvalidRequest(format!("Invalid JSON requests: {}", e)))
    } else if trimmed.starts_with('{') {
        serde_json::from_str(trimmed)
            .map(|request| vec![request])
            .map_err(|e| Error::InvalidRequest(format!("Invalid JSON request: {}", e)))
    } else {
        Err(Error::InvalidRequest(
            "Input must be a JSON object or array of objects".into(),
        ))
    }
}

/// Deploy a fresh lottery and run a scenario against it (public API)
///
/// # Returns
/// Pretty JSON of the [`ScenarioReport`]
///
/// # Errors
/// `InvalidRequest` for malformed input, `Config` for an invalid config.
/// Failing steps are not errors; they end the run and are reported.
pub fn run_scenario(config: &Config, input: &str) -> Result<String> {
    let requests = parse_requests(input)?;
    let executor = Executor::deploy(config)?;
    let report = executor.run(&requests);

    serde_json::to_string_pretty(&report)
        .map_err(|e| Error::InvalidRequest(format!("Failed to serialize report: {}", e)))
}

// ── Tests ─────────────────────────────────────────────────
