//! The ledger aggregate: agents, their T-accounts and the transaction log.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use catledger_core::{Aggregate, AggregateRoot, AgentId, Amount, LedgerError, LedgerResult, collect_unique};
use catledger_events::{EconomicEvent, EventType};

use crate::account::{Account, Side, update_account};
use crate::agent::Agent;
use crate::handlers;

/// One `update_account` call decided by an event handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub event_type: EventType,
    pub date: NaiveDate,
    pub agent: AgentId,
    pub account: String,
    pub side: Side,
    pub amount: Amount,
}

/// Append-only transaction log row, written once per booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub sequence: u64,
    pub date: NaiveDate,
    pub event_type: EventType,
    pub agent: AgentId,
    pub account: String,
    pub debit_balance: f64,
    pub credit_balance: f64,
    pub net: f64,
}

/// Aggregate root: the whole multi-agent ledger.
///
/// The ledger is an owned value passed explicitly to every operation; cloning
/// it gives an independent snapshot for what-if runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    name: String,
    agents: BTreeMap<AgentId, Agent>,
    journal: Vec<TransactionRow>,
    last_date: Option<NaiveDate>,
    events_processed: u64,
    version: u64,
}

impl Ledger {
    pub fn new(agents: impl IntoIterator<Item = Agent>) -> LedgerResult<Self> {
        Ok(Self {
            name: "ledger".to_string(),
            agents: collect_unique(agents, "ledger")?,
            journal: Vec::new(),
            last_date: None,
            events_processed: 0,
            version: 0,
        })
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.get(name)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn require_agent(&self, name: &str) -> LedgerResult<&Agent> {
        self.agents
            .get(name)
            .ok_or_else(|| LedgerError::UnknownAgent(name.to_string()))
    }

    pub fn account(&self, agent: &str, account: &str) -> Option<&Account> {
        self.agents.get(agent).and_then(|a| a.account(account))
    }

    pub fn require_account(&self, agent: &str, account: &str) -> LedgerResult<&Account> {
        self.require_agent(agent)?
            .account(account)
            .ok_or_else(|| LedgerError::unknown_account(agent, account))
    }

    /// Transaction log, oldest first.
    pub fn journal(&self) -> &[TransactionRow] {
        &self.journal
    }

    /// Date of the last processed event.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last_date
    }

    /// Latest date seen anywhere in the books, including bookings made
    /// outside the event processor.
    pub fn current_date(&self) -> Option<NaiveDate> {
        let latest_entry = self
            .agents
            .values()
            .flat_map(|a| a.accounts())
            .filter_map(|a| a.entries().last().map(|e| e.date))
            .max();
        match (self.last_date, latest_entry) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Raw booking that bypasses the event processor: nothing is journaled
    /// and no invariant is checked. Used to reproduce corrupted books.
    pub fn update_account(
        &mut self,
        agent: &str,
        account: &str,
        amount: Amount,
        side: Side,
        date: NaiveDate,
    ) -> LedgerResult<()> {
        let target = self
            .agents
            .get_mut(agent)
            .ok_or_else(|| LedgerError::UnknownAgent(agent.to_string()))?
            .account_mut(account)
            .ok_or_else(|| LedgerError::unknown_account(agent, account))?;
        update_account(target, amount, side, date);
        Ok(())
    }

    pub(crate) fn record_event(&mut self, date: NaiveDate) {
        self.last_date = Some(self.last_date.map_or(date, |d| d.max(date)));
        self.events_processed += 1;
    }
}

impl AggregateRoot for Ledger {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.name
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for Ledger {
    type Input = EconomicEvent;
    type Change = Posting;
    type Error = LedgerError;

    fn decide(&self, event: &EconomicEvent) -> LedgerResult<Vec<Posting>> {
        handlers::decide(self, event)
    }

    fn apply(&mut self, posting: &Posting) {
        let Some(account) = self
            .agents
            .get_mut(posting.agent.as_str())
            .and_then(|a| a.account_mut(&posting.account))
        else {
            // `decide` resolves every account before emitting postings.
            tracing::error!(
                agent = %posting.agent,
                account = %posting.account,
                "posting targets an unknown account; skipped"
            );
            return;
        };

        update_account(account, posting.amount, posting.side, posting.date);
        let row = TransactionRow {
            sequence: self.journal.len() as u64 + 1,
            date: posting.date,
            event_type: posting.event_type,
            agent: posting.agent.clone(),
            account: posting.account.clone(),
            debit_balance: account.debit(),
            credit_balance: account.credit(),
            net: account.net(),
        };
        self.journal.push(row);
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::standard_ledger;
    use catledger_events::execute;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn duplicate_agents_are_rejected() {
        let agents = crate::chart::standard_agents().unwrap();
        let twice = agents.iter().cloned().chain(agents.iter().take(1).cloned());
        assert!(Ledger::new(twice).is_err());
    }

    #[test]
    fn execute_applies_postings_and_journals_each_booking() {
        let mut ledger = standard_ledger().unwrap();
        let event = EconomicEvent::new(
            EventType::MoneyCreation,
            date(1),
            AgentId::new("CB").unwrap(),
            Amount::new(1000.0).unwrap(),
        )
        .with_accounts(["Paper Money", "Paper Money in Circulation"]);

        let postings = execute(&mut ledger, &event).unwrap();
        assert_eq!(postings.len(), 2);
        assert_eq!(ledger.version(), 2);
        assert_eq!(ledger.journal().len(), 2);

        let row = &ledger.journal()[1];
        assert_eq!(row.sequence, 2);
        assert_eq!(row.account, "Paper Money in Circulation");
        assert_eq!(row.credit_balance, 1000.0);
        assert_eq!(row.net, -1000.0);
    }

    #[test]
    fn raw_update_is_not_journaled() {
        let mut ledger = standard_ledger().unwrap();
        ledger
            .update_account("Banks", "Deposits at Bankb", Amount::new(100.0).unwrap(), Side::Debit, date(3))
            .unwrap();
        assert!(ledger.journal().is_empty());
        assert_eq!(ledger.last_date(), None);
        assert_eq!(ledger.current_date(), Some(date(3)));
        assert_eq!(ledger.account("Banks", "Deposits at Bankb").unwrap().debit(), 100.0);
    }

    #[test]
    fn raw_update_on_unknown_account_fails() {
        let mut ledger = standard_ledger().unwrap();
        let err = ledger
            .update_account("CB", "Cash", Amount::new(1.0).unwrap(), Side::Debit, date(1))
            .unwrap_err();
        assert_eq!(err, LedgerError::unknown_account("CB", "Cash"));
    }
}
