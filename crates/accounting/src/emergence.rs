//! Money emergence: recognizing linked accounts as monetary instruments.
//!
//! A complex link names the accounts that, held open across two agents,
//! constitute an instrument (a bank deposit, a bill of exchange). Matching
//! runs over an [`AccountIndex`] built once per snapshot.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use catledger_core::{AgentId, LedgerError, approx_zero};

use crate::account::Account;
use crate::chart::{LIABILITY_FROM_BOE, RECEIVABLE_FROM_BOE};
use crate::ledger::Ledger;

pub const BANK_DEPOSITS: &str = "Bank Deposits";
pub const SIGHT_DEPOSITS: &str = "Sight Deposits";
pub const BILLS_OF_EXCHANGE: &str = "Bills of Exchange";

/// A binding mechanism and the accounts it links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplexLink {
    pub mechanism: &'static str,
    pub accounts: &'static [&'static str],
    pub property: &'static str,
}

pub static COMPLEX_LINKS: &[ComplexLink] = &[
    ComplexLink {
        mechanism: "Correspondent Banking",
        accounts: &["Deposits at Bankb", "Deposits from Banks"],
        property: BANK_DEPOSITS,
    },
    ComplexLink {
        mechanism: "Correspondent Banking",
        accounts: &["Deposits at Banks", "Deposits from Bankb"],
        property: BANK_DEPOSITS,
    },
    ComplexLink {
        mechanism: "Deposit Banking",
        accounts: &["Sight Deposit at Banks", "Sight Deposits of S"],
        property: SIGHT_DEPOSITS,
    },
    ComplexLink {
        mechanism: "Deposit Banking",
        accounts: &["Sight Deposit at Bankb", "Sight Deposits of B"],
        property: SIGHT_DEPOSITS,
    },
    ComplexLink {
        mechanism: "Trade Credit",
        accounts: &[RECEIVABLE_FROM_BOE, LIABILITY_FROM_BOE],
        property: BILLS_OF_EXCHANGE,
    },
];

/// Links producing `property`.
pub fn links_for(property: &str) -> impl Iterator<Item = &'static ComplexLink> + '_ {
    COMPLEX_LINKS.iter().filter(move |l| l.property == property)
}

/// An open account taking part in a pattern, with its net position at
/// detection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAccount {
    pub agent: AgentId,
    pub account: String,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyPattern {
    pub property: String,
    pub mechanism: String,
    pub agents: (AgentId, AgentId),
    pub accounts: Vec<PatternAccount>,
}

impl MoneyPattern {
    /// Σ(debit − credit) over the pattern's accounts.
    pub fn net(&self) -> f64 {
        self.accounts.iter().map(|a| a.net).sum()
    }

    /// Absolute net position of the first account: the instrument's size.
    pub fn outstanding(&self) -> f64 {
        self.accounts.first().map_or(0.0, |a| a.net.abs())
    }
}

/// Account name → holders, over one ledger snapshot.
#[derive(Debug)]
pub struct AccountIndex<'a> {
    by_name: BTreeMap<&'a str, Vec<(&'a AgentId, &'a Account)>>,
}

impl<'a> AccountIndex<'a> {
    pub fn build(ledger: &'a Ledger) -> Self {
        let mut by_name: BTreeMap<&str, Vec<_>> = BTreeMap::new();
        for agent in ledger.agents() {
            for account in agent.accounts() {
                by_name
                    .entry(account.name())
                    .or_default()
                    .push((agent.id_typed(), account));
            }
        }
        Self { by_name }
    }

    pub fn holders(&self, account: &str) -> &[(&'a AgentId, &'a Account)] {
        self.by_name.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Holders of `account` with a non-zero net position.
    pub fn open(&self, account: &str) -> impl Iterator<Item = (&'a AgentId, &'a Account)> + '_ {
        self.holders(account)
            .iter()
            .copied()
            .filter(|(_, a)| !approx_zero(a.net()))
    }

    /// Whether any holder of `account` has ever booked it.
    pub fn touched(&self, account: &str) -> bool {
        self.holders(account).iter().any(|(_, a)| !a.is_untouched())
    }
}

fn match_pair(
    index: &AccountIndex<'_>,
    link: &ComplexLink,
    pair: (&AgentId, &AgentId),
) -> Option<MoneyPattern> {
    let mut accounts = Vec::new();
    for name in link.accounts {
        let before = accounts.len();
        accounts.extend(
            index
                .open(name)
                .filter(|(id, _)| *id == pair.0 || *id == pair.1)
                .map(|(id, a)| PatternAccount {
                    agent: id.clone(),
                    account: a.name().to_string(),
                    net: a.net(),
                }),
        );
        if accounts.len() == before {
            return None;
        }
    }
    Some(MoneyPattern {
        property: link.property.to_string(),
        mechanism: link.mechanism.to_string(),
        agents: (pair.0.clone(), pair.1.clone()),
        accounts,
    })
}

fn link_patterns(index: &AccountIndex<'_>, link: &ComplexLink) -> Vec<MoneyPattern> {
    let candidates: Vec<&AgentId> = link
        .accounts
        .iter()
        .flat_map(|name| index.open(name).map(|(id, _)| id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut patterns = Vec::new();
    for (i, a) in candidates.iter().enumerate() {
        for b in &candidates[i + 1..] {
            patterns.extend(match_pair(index, link, (*a, *b)));
        }
    }
    patterns
}

/// Every instrument held open between two agents, grouped by property.
pub fn detect_money_emergence(ledger: &Ledger) -> BTreeMap<String, Vec<MoneyPattern>> {
    let index = AccountIndex::build(ledger);
    let mut found: BTreeMap<String, Vec<MoneyPattern>> = BTreeMap::new();
    for link in COMPLEX_LINKS {
        let patterns = link_patterns(&index, link);
        if !patterns.is_empty() {
            found.entry(link.property.to_string()).or_default().extend(patterns);
        }
    }
    found
}

/// A pattern is backed when its accounts net to zero.
pub fn verify_money_emergence(pattern: &MoneyPattern) -> bool {
    approx_zero(pattern.net())
}

/// Detected patterns that are not backed, as reportable errors.
pub fn inconsistent_patterns(ledger: &Ledger) -> Vec<LedgerError> {
    detect_money_emergence(ledger)
        .into_values()
        .flatten()
        .filter(|p| !verify_money_emergence(p))
        .map(|p| LedgerError::EmergenceInconsistency {
            imbalance: p.net(),
            property: p.property,
        })
        .collect()
}

/// Outstanding amount per property over backed patterns.
///
/// Every registered property is present, at zero when nothing is open.
/// Unbacked patterns are excluded and logged.
pub fn get_money_supply(ledger: &Ledger) -> BTreeMap<String, f64> {
    let mut supply: BTreeMap<String, f64> = COMPLEX_LINKS
        .iter()
        .map(|l| (l.property.to_string(), 0.0))
        .collect();

    for (property, patterns) in detect_money_emergence(ledger) {
        let total = supply.entry(property).or_default();
        for pattern in patterns {
            if verify_money_emergence(&pattern) {
                *total += pattern.outstanding();
            } else {
                let err = LedgerError::EmergenceInconsistency {
                    property: pattern.property.clone(),
                    imbalance: pattern.net(),
                };
                tracing::warn!(
                    error = %err,
                    agents = ?pattern.agents,
                    "pattern excluded from money supply"
                );
            }
        }
    }
    supply
}

/// Where an instrument stands in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentState {
    /// None of the linked accounts has been booked.
    Unopened,
    /// Held open between these agent pairs.
    Open(Vec<(AgentId, AgentId)>),
    /// Booked at some point, now settled to zero.
    Closed,
}

pub fn instrument_lifecycle(ledger: &Ledger, link: &ComplexLink) -> InstrumentState {
    let index = AccountIndex::build(ledger);
    let pairs: Vec<_> = link_patterns(&index, link)
        .into_iter()
        .map(|p| p.agents)
        .collect();
    if !pairs.is_empty() {
        InstrumentState::Open(pairs)
    } else if link.accounts.iter().any(|a| index.touched(a)) {
        InstrumentState::Closed
    } else {
        InstrumentState::Unopened
    }
}
