use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use catledger_core::{AgentId, Amount, LedgerError, LedgerResult};

/// A domain-agnostic event.
///
/// Events are immutable facts, applied strictly in non-decreasing date order.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "ledger.money_creation").
    fn event_type(&self) -> &'static str;

    /// Business date of the event.
    fn occurred_at(&self) -> NaiveDate;
}

/// Closed set of economic event types the ledger knows how to book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    MoneyCreation,
    InterbankLoan,
    Purchase,
    BillOfExchangeCreation,
    BillOfExchangeTransfer,
    Settlement,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::MoneyCreation,
        EventType::InterbankLoan,
        EventType::Purchase,
        EventType::BillOfExchangeCreation,
        EventType::BillOfExchangeTransfer,
        EventType::Settlement,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::MoneyCreation => "ledger.money_creation",
            EventType::InterbankLoan => "ledger.interbank_loan",
            EventType::Purchase => "ledger.purchase",
            EventType::BillOfExchangeCreation => "ledger.bill_of_exchange_creation",
            EventType::BillOfExchangeTransfer => "ledger.bill_of_exchange_transfer",
            EventType::Settlement => "ledger.settlement",
        }
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input record from the scenario generator.
///
/// `agent` is the primary agent; `counterparties` lists the other agents the
/// event touches, in the role order of its event type. `accounts` are the
/// account names the handler books, also in role order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicEvent {
    pub event_type: EventType,
    pub date: NaiveDate,
    pub agent: AgentId,
    #[serde(default)]
    pub counterparties: Vec<AgentId>,
    pub accounts: Vec<String>,
    pub amount: Amount,
}

impl EconomicEvent {
    pub fn new(event_type: EventType, date: NaiveDate, agent: AgentId, amount: Amount) -> Self {
        Self {
            event_type,
            date,
            agent,
            counterparties: Vec::new(),
            accounts: Vec::new(),
            amount,
        }
    }

    pub fn with_counterparty(mut self, agent: AgentId) -> Self {
        self.counterparties.push(agent);
        self
    }

    pub fn with_accounts<I, S>(mut self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accounts = accounts.into_iter().map(Into::into).collect();
        self
    }

    /// Primary agent followed by the counterparties.
    pub fn agents(&self) -> impl Iterator<Item = &AgentId> {
        core::iter::once(&self.agent).chain(self.counterparties.iter())
    }

    /// Shape checks that do not need ledger state.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.accounts.len() < 2 {
            return Err(LedgerError::validation(format!(
                "{} needs at least two account names (got {})",
                self.event_type,
                self.accounts.len()
            )));
        }
        if let Some(blank) = self.accounts.iter().position(|a| a.trim().is_empty()) {
            return Err(LedgerError::validation(format!(
                "{}: account name at position {blank} is empty",
                self.event_type
            )));
        }
        let agents: Vec<&AgentId> = self.agents().collect();
        for (i, a) in agents.iter().enumerate() {
            if agents[..i].contains(a) {
                return Err(LedgerError::validation(format!(
                    "{}: agent {a} appears more than once",
                    self.event_type
                )));
            }
        }
        Ok(())
    }
}

impl Event for EconomicEvent {
    fn event_type(&self) -> &'static str {
        self.event_type.as_str()
    }

    fn occurred_at(&self) -> NaiveDate {
        self.date
    }
}
