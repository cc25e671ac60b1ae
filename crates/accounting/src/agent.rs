//! Agents: named economic participants holding T-accounts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use catledger_core::{AgentId, Entity, LedgerResult, collect_unique};

use crate::account::Account;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    id: AgentId,
    accounts: BTreeMap<String, Account>,
}

impl Agent {
    /// Create an agent with zero-balance accounts.
    ///
    /// Account names must be unique within the agent.
    pub fn new(id: AgentId, accounts: impl IntoIterator<Item = Account>) -> LedgerResult<Self> {
        let accounts = collect_unique(accounts, &format!("agent {id}"))?;
        Ok(Self { id, accounts })
    }

    pub fn id_typed(&self) -> &AgentId {
        &self.id
    }

    pub fn account(&self, name: &str) -> Option<&Account> {
        self.accounts.get(name)
    }

    pub fn has_account(&self, name: &str) -> bool {
        self.accounts.contains_key(name)
    }

    /// Mutable access for the event processor and for corruption scenarios.
    pub fn account_mut(&mut self, name: &str) -> Option<&mut Account> {
        self.accounts.get_mut(name)
    }

    /// Accounts ordered by name.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn total_debit(&self) -> f64 {
        self.accounts.values().map(Account::debit).sum()
    }

    pub fn total_credit(&self) -> f64 {
        self.accounts.values().map(Account::credit).sum()
    }

    /// Σdebit − Σcredit over the agent's own books.
    pub fn imbalance(&self) -> f64 {
        self.total_debit() - self.total_credit()
    }
}

impl Entity for Agent {
    type Id = AgentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
