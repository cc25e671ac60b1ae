//! Micro (per-agent) and macro (per debt relationship) invariance.

use serde::Serialize;

use catledger_core::{LedgerError, LedgerResult, approx_zero};

use crate::agent::Agent;
use crate::chart::{BUYER_BANK, LIABILITY_FROM_BOE, RECEIVABLE_FROM_BOE, SELLER_BANK};
use crate::ledger::Ledger;

/// One side of a debt relationship: an account name, optionally restricted to
/// a single holder when several agents carry the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelationshipLeg {
    pub account: &'static str,
    pub holder: Option<&'static str>,
}

impl RelationshipLeg {
    pub const fn any(account: &'static str) -> Self {
        Self {
            account,
            holder: None,
        }
    }

    pub const fn held_by(account: &'static str, holder: &'static str) -> Self {
        Self {
            account,
            holder: Some(holder),
        }
    }

    /// Whether `agent` carries this leg.
    pub fn is_held_by(&self, agent: &Agent) -> bool {
        self.holder.is_none_or(|h| h == agent.id_typed().as_str()) && agent.has_account(self.account)
    }

    /// Σ(debit − credit) of this leg across its holders.
    pub fn net(&self, ledger: &Ledger) -> f64 {
        holders(ledger, self)
            .filter_map(|agent| agent.account(self.account))
            .map(|a| a.net())
            .sum()
    }
}

/// A claim that must be offset by exactly one liability elsewhere in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DebtRelationshipPair {
    pub claim: RelationshipLeg,
    pub liability: RelationshipLeg,
}

impl DebtRelationshipPair {
    pub const fn new(claim: RelationshipLeg, liability: RelationshipLeg) -> Self {
        Self { claim, liability }
    }

    /// `"<claim> ↔ <liability>"`.
    pub fn name(&self) -> String {
        format!("{} ↔ {}", self.claim.account, self.liability.account)
    }
}

/// Closed registry of debt relationships in the standard economy.
pub static STANDARD_RELATIONSHIPS: &[DebtRelationshipPair] = &[
    DebtRelationshipPair::new(
        RelationshipLeg::any("Loans to Banks"),
        RelationshipLeg::held_by("Loans from CB", SELLER_BANK),
    ),
    DebtRelationshipPair::new(
        RelationshipLeg::any("Loans to Bankb"),
        RelationshipLeg::held_by("Loans from CB", BUYER_BANK),
    ),
    DebtRelationshipPair::new(
        RelationshipLeg::held_by("CB Reserve", SELLER_BANK),
        RelationshipLeg::any("Reserves of Banks"),
    ),
    DebtRelationshipPair::new(
        RelationshipLeg::held_by("CB Reserve", BUYER_BANK),
        RelationshipLeg::any("Reserves of Bankb"),
    ),
    DebtRelationshipPair::new(
        RelationshipLeg::any("Deposits at Bankb"),
        RelationshipLeg::any("Deposits from Banks"),
    ),
    DebtRelationshipPair::new(
        RelationshipLeg::any("Deposits at Banks"),
        RelationshipLeg::any("Deposits from Bankb"),
    ),
    DebtRelationshipPair::new(
        RelationshipLeg::any("Sight Deposit at Banks"),
        RelationshipLeg::any("Sight Deposits of S"),
    ),
    DebtRelationshipPair::new(
        RelationshipLeg::any("Sight Deposit at Bankb"),
        RelationshipLeg::any("Sight Deposits of B"),
    ),
    DebtRelationshipPair::new(
        RelationshipLeg::any(RECEIVABLE_FROM_BOE),
        RelationshipLeg::any(LIABILITY_FROM_BOE),
    ),
];

pub fn find_relationship(name: &str) -> Option<&'static DebtRelationshipPair> {
    STANDARD_RELATIONSHIPS.iter().find(|p| p.name() == name)
}

/// Agents carrying `leg`, ordered by name.
pub fn holders<'a>(ledger: &'a Ledger, leg: &'a RelationshipLeg) -> impl Iterator<Item = &'a Agent> {
    ledger.agents().filter(move |agent| leg.is_held_by(agent))
}

/// Combined net position of both legs; zero when the relationship is intact.
pub fn relationship_net(ledger: &Ledger, pair: &DebtRelationshipPair) -> f64 {
    pair.claim.net(ledger) + pair.liability.net(ledger)
}

/// Σdebit == Σcredit across the agent's own accounts.
pub fn check_micro_invariance(agent: &Agent) -> bool {
    approx_zero(agent.imbalance())
}

/// Raise on the first agent whose books do not balance.
pub fn check_all_micro(ledger: &Ledger) -> LedgerResult<()> {
    match ledger.agents().find(|a| !check_micro_invariance(a)) {
        Some(agent) => Err(LedgerError::MicroInvarianceViolation {
            agent: agent.id_typed().to_string(),
            imbalance: agent.imbalance(),
        }),
        None => Ok(()),
    }
}

fn check_pair(ledger: &Ledger, pair: &DebtRelationshipPair) -> LedgerResult<()> {
    let net = relationship_net(ledger, pair);
    if approx_zero(net) {
        Ok(())
    } else {
        Err(LedgerError::MacroInvarianceViolation {
            relationship: pair.name(),
            imbalance: net,
        })
    }
}

/// Raise on the first registered relationship that does not net to zero.
pub fn check_macro_invariance(ledger: &Ledger) -> LedgerResult<()> {
    STANDARD_RELATIONSHIPS
        .iter()
        .try_for_each(|pair| check_pair(ledger, pair))
}

/// Check a single named relationship.
pub fn check_relationship(ledger: &Ledger, name: &str) -> LedgerResult<()> {
    let pair = find_relationship(name)
        .ok_or_else(|| LedgerError::validation(format!("unknown relationship: {name}")))?;
    check_pair(ledger, pair)
}

/// Bills of exchange: receivables and BOE liabilities net to zero.
pub fn check_boe_macro_invariance(ledger: &Ledger) -> LedgerResult<()> {
    check_pair(
        ledger,
        &DebtRelationshipPair::new(
            RelationshipLeg::any(RECEIVABLE_FROM_BOE),
            RelationshipLeg::any(LIABILITY_FROM_BOE),
        ),
    )
}
