//! Read model: per-agent balance sheet.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use catledger_core::{AgentId, LedgerResult};

use crate::account::AccountKind;
use crate::ledger::Ledger;

/// Balances on each account's normal side, grouped by kind.
///
/// Unclassified accounts (equity) are not listed; `net_worth` is what they
/// must absorb for the agent to balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub agent: AgentId,
    pub assets: BTreeMap<String, f64>,
    pub liabilities: BTreeMap<String, f64>,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub net_worth: f64,
}

pub fn balance_sheet(ledger: &Ledger, agent: &str) -> LedgerResult<BalanceSheet> {
    let agent = ledger.require_agent(agent)?;

    let mut assets = BTreeMap::new();
    let mut liabilities = BTreeMap::new();
    for account in agent.accounts() {
        let lines = match account.kind() {
            Some(AccountKind::Asset) => &mut assets,
            Some(AccountKind::Liability) => &mut liabilities,
            None => continue,
        };
        lines.insert(account.name().to_string(), account.balance());
    }

    let total_assets: f64 = assets.values().sum();
    let total_liabilities: f64 = liabilities.values().sum();
    Ok(BalanceSheet {
        agent: agent.id_typed().clone(),
        assets,
        liabilities,
        total_assets,
        total_liabilities,
        net_worth: total_assets - total_liabilities,
    })
}

/// Balance sheets of every agent, ordered by name.
pub fn balance_sheets(ledger: &Ledger) -> LedgerResult<Vec<BalanceSheet>> {
    ledger
        .agents()
        .map(|a| balance_sheet(ledger, a.id_typed().as_str()))
        .collect()
}
