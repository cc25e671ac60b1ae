//! Fracture detection and resynchronization.
//!
//! A fracture is a registered relationship whose legs no longer net to zero.
//! Resynchronization repairs each one with a synthesized settlement between
//! the agent whose one-sided booking opened it (the originator) and the
//! holder of the opposite leg.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use catledger_core::{AgentId, Amount, LedgerError, LedgerResult, TOLERANCE, approx_zero};
use catledger_events::{EconomicEvent, EventType};

use crate::agent::Agent;
use crate::chart::{CASH, CB_RESERVE, PAPER_MONEY, reserves_of};
use crate::config::{EngineConfig, SettlementRoute};
use crate::invariance::{DebtRelationshipPair, STANDARD_RELATIONSHIPS, find_relationship, holders, relationship_net};
use crate::ledger::Ledger;
use crate::processor::process_event_with;

/// Means of payment for `SettlementRoute::Direct`, in order of preference.
pub const DIRECT_FUNDING: &[&str] = &[CASH, PAPER_MONEY];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fracture {
    pub relationship: String,
    pub imbalance: f64,
}

/// Every relationship whose net position is not zero, with that position.
pub fn detect_fractures(ledger: &Ledger) -> BTreeMap<String, f64> {
    STANDARD_RELATIONSHIPS
        .iter()
        .filter_map(|pair| {
            let net = relationship_net(ledger, pair);
            (!approx_zero(net)).then(|| (pair.name(), net))
        })
        .collect()
}

pub fn fracture_list(ledger: &Ledger) -> Vec<Fracture> {
    detect_fractures(ledger)
        .into_iter()
        .map(|(relationship, imbalance)| Fracture {
            relationship,
            imbalance,
        })
        .collect()
}

struct Parties<'a> {
    originator: &'a Agent,
    counterparty: &'a Agent,
    counterparty_leg: &'static str,
    /// Part of the fracture the originator's own books are out by.
    covered: f64,
}

/// Share of `imbalance` accounted for by `agent`'s own unbalanced books.
fn coverage(agent: &Agent, imbalance: f64) -> f64 {
    let own = agent.imbalance();
    if approx_zero(own) || own.signum() != imbalance.signum() {
        0.0
    } else {
        own.abs().min(imbalance.abs())
    }
}

/// Pick the parties by leg: the originator holds one leg of the broken pair,
/// the counterparty a different agent holding the other.
///
/// The originator is the holder whose own books cover most of the fracture.
/// When nobody's books are off, the leg carrying the larger position (the
/// claim on a tie) is taken as the booked one.
fn locate<'a>(ledger: &'a Ledger, pair: &'a DebtRelationshipPair, imbalance: f64) -> Option<Parties<'a>> {
    let claim: Vec<&Agent> = holders(ledger, &pair.claim).collect();
    let liability: Vec<&Agent> = holders(ledger, &pair.liability).collect();

    let mut sides = [
        (&claim, &liability, pair.liability.account),
        (&liability, &claim, pair.claim.account),
    ];
    if pair.liability.net(ledger).abs() > pair.claim.net(ledger).abs() + TOLERANCE {
        sides.swap(0, 1);
    }

    let mut best: Option<Parties<'a>> = None;
    for (own, other, other_leg) in sides {
        for originator in own.iter().copied() {
            let Some(counterparty) = other.iter().copied().find(|a| a.id_typed() != originator.id_typed())
            else {
                continue;
            };
            let covered = coverage(originator, imbalance);
            if best.as_ref().is_none_or(|b| covered > b.covered + TOLERANCE) {
                best = Some(Parties {
                    originator,
                    counterparty,
                    counterparty_leg: other_leg,
                    covered,
                });
            }
        }
    }
    best
}

fn direct_funding(agent: &Agent) -> Option<&'static str> {
    DIRECT_FUNDING.iter().copied().find(|a| agent.has_account(a))
}

/// (debit, credit) for the counterparty: claims too high or liabilities too
/// low are closed by crediting its leg, the reverse case by debiting it.
fn counterparty_sides<'s>(imbalance: f64, funding: &'s str, leg: &'s str) -> (&'s str, &'s str) {
    if imbalance > 0.0 { (funding, leg) } else { (leg, funding) }
}

/// Transfer of the covered part: the originator closes its own imbalance,
/// the counterparty books its leg, optionally routed through the clearing
/// agent's reserve accounts.
fn covered_transfer(
    ledger: &Ledger,
    parties: &Parties<'_>,
    imbalance: f64,
    date: NaiveDate,
    route: SettlementRoute,
    config: &EngineConfig,
) -> LedgerResult<Option<EconomicEvent>> {
    let originator = parties.originator.id_typed();
    let counterparty = parties.counterparty.id_typed();

    let (originator_funding, counterparty_funding) = match route {
        SettlementRoute::Direct => {
            match (direct_funding(parties.originator), direct_funding(parties.counterparty)) {
                (Some(o), Some(c)) => (o, c),
                _ => return Ok(None),
            }
        }
        SettlementRoute::ViaClearing => {
            if !(parties.originator.has_account(CB_RESERVE) && parties.counterparty.has_account(CB_RESERVE)) {
                return Ok(None);
            }
            (CB_RESERVE, CB_RESERVE)
        }
    };
    let (cp_debit, cp_credit) = counterparty_sides(imbalance, counterparty_funding, parties.counterparty_leg);

    let mut event = EconomicEvent::new(
        EventType::Settlement,
        date,
        originator.clone(),
        Amount::new(parties.covered)?,
    )
    .with_counterparty(counterparty.clone());
    let mut accounts = vec![
        originator_funding.to_string(),
        cp_debit.to_string(),
        cp_credit.to_string(),
    ];

    if route == SettlementRoute::ViaClearing {
        let Some(clearing) = ledger.agent(&config.clearing_agent) else {
            return Ok(None);
        };
        let clearing_id: &AgentId = clearing.id_typed();
        if clearing_id == originator || clearing_id == counterparty {
            return Ok(None);
        }
        let (outgoing, incoming) = (reserves_of(originator.as_str()), reserves_of(counterparty.as_str()));
        if !(clearing.has_account(&outgoing) && clearing.has_account(&incoming)) {
            return Ok(None);
        }
        let (debit, credit) = if imbalance > 0.0 {
            (outgoing, incoming)
        } else {
            (incoming, outgoing)
        };
        event = event.with_counterparty(clearing_id.clone());
        accounts.push(debit);
        accounts.push(credit);
    }

    Ok(Some(event.with_accounts(accounts)))
}

/// Synthesize the settlements that close `fracture` over `route`.
///
/// The part of the fracture the originator's books are out by is settled as
/// a transfer over `route`. Whatever remains is completed by the counterparty
/// alone, against its direct funding account, since no money changes hands.
/// An empty plan means the parties lack the accounts a settlement needs.
pub fn plan_settlement(
    ledger: &Ledger,
    fracture: &Fracture,
    route: SettlementRoute,
    config: &EngineConfig,
) -> LedgerResult<Vec<EconomicEvent>> {
    let pair = find_relationship(&fracture.relationship).ok_or_else(|| {
        LedgerError::validation(format!("unknown relationship: {}", fracture.relationship))
    })?;
    let imbalance = fracture.imbalance;
    let Some(parties) = locate(ledger, pair, imbalance) else {
        return Ok(Vec::new());
    };
    let date = ledger
        .current_date()
        .ok_or_else(|| LedgerError::validation("cannot date a settlement on empty books"))?;

    let mut plan = Vec::with_capacity(2);
    if !approx_zero(parties.covered) {
        match covered_transfer(ledger, &parties, imbalance, date, route, config)? {
            Some(event) => plan.push(event),
            None => return Ok(Vec::new()),
        }
    }

    let remainder = imbalance.abs() - parties.covered;
    if !approx_zero(remainder) {
        let Some(funding) = direct_funding(parties.counterparty) else {
            return Ok(Vec::new());
        };
        let (debit, credit) = counterparty_sides(imbalance, funding, parties.counterparty_leg);
        plan.push(
            EconomicEvent::new(
                EventType::Settlement,
                date,
                parties.counterparty.id_typed().clone(),
                Amount::magnitude(remainder)?,
            )
            .with_accounts([debit, credit]),
        );
    }
    Ok(plan)
}

/// Resynchronize under the default configuration.
pub fn resynchronize(ledger: &mut Ledger) -> LedgerResult<bool> {
    resynchronize_with(ledger, &EngineConfig::default())
}

/// One repair pass over the current fractures.
///
/// Each settlement goes through the event processor. Cascading fractures are
/// not chased: the result is whether the books are fracture-free afterwards.
pub fn resynchronize_with(ledger: &mut Ledger, config: &EngineConfig) -> LedgerResult<bool> {
    let fractures = fracture_list(ledger);
    if fractures.is_empty() {
        return Ok(true);
    }
    tracing::info!(fractures = fractures.len(), route = ?config.settlement_route, "resynchronizing");

    for fracture in &fractures {
        let plan = plan_settlement(ledger, fracture, config.settlement_route, config)?;
        if plan.is_empty() {
            tracing::warn!(
                relationship = %fracture.relationship,
                imbalance = fracture.imbalance,
                "no settlement path for fracture; left open"
            );
        }
        for event in &plan {
            process_event_with(ledger, event, config)?;
        }
    }

    let remaining = detect_fractures(ledger);
    if !remaining.is_empty() {
        tracing::warn!(remaining = remaining.len(), "fractures remain after resynchronization");
    }
    Ok(remaining.is_empty())
}

/// Outcome of settling the same fracture along each route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionPaths {
    pub relationship: String,
    pub direct: bool,
    pub via_clearing: bool,
}

impl ResolutionPaths {
    /// Both routes close the fracture.
    pub fn is_path_independent(&self) -> bool {
        self.direct && self.via_clearing
    }
}

/// Settle `fracture` on independent copies of the books, once bilaterally
/// and once through the clearing agent, and report which copies end up
/// without it.
pub fn verify_resolution_paths(ledger: &Ledger, fracture: &Fracture) -> LedgerResult<ResolutionPaths> {
    verify_resolution_paths_with(ledger, fracture, &EngineConfig::default())
}

pub fn verify_resolution_paths_with(
    ledger: &Ledger,
    fracture: &Fracture,
    config: &EngineConfig,
) -> LedgerResult<ResolutionPaths> {
    let attempt = |route: SettlementRoute| -> LedgerResult<bool> {
        let mut trial = ledger.clone();
        let plan = plan_settlement(&trial, fracture, route, config)?;
        if plan.is_empty() {
            return Ok(false);
        }
        for event in &plan {
            process_event_with(&mut trial, event, config)?;
        }
        Ok(!detect_fractures(&trial).contains_key(&fracture.relationship))
    };

    Ok(ResolutionPaths {
        relationship: fracture.relationship.clone(),
        direct: attempt(SettlementRoute::Direct)?,
        via_clearing: attempt(SettlementRoute::ViaClearing)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Side;
    use crate::chart::{agent_with_accounts, standard_ledger};
    use crate::invariance::check_all_micro;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
    }

    fn corrupt(ledger: &mut Ledger, agent: &str, account: &str, side: Side, v: f64) {
        ledger
            .update_account(agent, account, Amount::new(v).unwrap(), side, date())
            .unwrap();
    }

    #[test]
    fn synchronized_books_have_no_fractures() {
        let mut ledger = standard_ledger().unwrap();
        assert!(detect_fractures(&ledger).is_empty());
        assert!(resynchronize(&mut ledger).unwrap());
        assert_eq!(ledger.events_processed(), 0);
        assert!(detect_fractures(&ledger).is_empty());
    }

    #[test]
    fn excess_liability_is_settled_in_reverse() {
        let mut ledger = standard_ledger().unwrap();
        corrupt(&mut ledger, "Bankb", "Sight Deposits of B", Side::Credit, 60.0);
        assert_eq!(
            detect_fractures(&ledger),
            BTreeMap::from([("Sight Deposit at Bankb ↔ Sight Deposits of B".to_string(), -60.0)])
        );

        assert!(resynchronize(&mut ledger).unwrap());
        // Bankb completes its booking with a cash debit; B books the deposit.
        assert_eq!(ledger.account("Bankb", "Cash").unwrap().debit(), 60.0);
        assert_eq!(ledger.account("B", "Sight Deposit at Bankb").unwrap().debit(), 60.0);
        assert_eq!(ledger.account("B", "Cash").unwrap().credit(), 60.0);
        check_all_micro(&ledger).unwrap();
    }

    #[test]
    fn balanced_originator_leaves_completion_to_the_counterparty() {
        let mut ledger = standard_ledger().unwrap();
        // Balanced inside Banks, unmatched at Bankb.
        corrupt(&mut ledger, "Banks", "Deposits at Bankb", Side::Debit, 100.0);
        corrupt(&mut ledger, "Banks", "Equity", Side::Credit, 100.0);

        assert!(resynchronize(&mut ledger).unwrap());
        assert_eq!(ledger.events_processed(), 1);
        assert_eq!(ledger.account("Bankb", "Deposits from Banks").unwrap().credit(), 100.0);
        assert_eq!(ledger.account("Bankb", "Cash").unwrap().debit(), 100.0);
        assert!(ledger.account("Banks", "Cash").unwrap().is_untouched());
        check_all_micro(&ledger).unwrap();
    }

    #[test]
    fn two_fractures_opened_by_one_agent_are_both_settled() {
        let mut ledger = standard_ledger().unwrap();
        corrupt(&mut ledger, "Banks", "Deposits at Bankb", Side::Debit, 100.0);
        corrupt(&mut ledger, "Banks", "CB Reserve", Side::Debit, 50.0);
        assert_eq!(ledger.agent("Banks").unwrap().imbalance(), 150.0);
        assert_eq!(detect_fractures(&ledger).len(), 2);

        assert!(resynchronize(&mut ledger).unwrap());
        assert_eq!(ledger.events_processed(), 2);
        assert_eq!(ledger.account("Banks", "Cash").unwrap().credit(), 150.0);
        assert_eq!(ledger.account("CB", "Reserves of Banks").unwrap().credit(), 50.0);
        assert_eq!(ledger.account("Bankb", "Deposits from Banks").unwrap().credit(), 100.0);
        check_all_micro(&ledger).unwrap();
        assert!(detect_fractures(&ledger).is_empty());
    }

    #[test]
    fn originator_closes_only_what_its_books_are_out_by() {
        let mut ledger = standard_ledger().unwrap();
        corrupt(&mut ledger, "Banks", "Deposits at Bankb", Side::Debit, 100.0);
        corrupt(&mut ledger, "Banks", "Equity", Side::Credit, 40.0);

        let fracture = fracture_list(&ledger).remove(0);
        let plan = plan_settlement(&ledger, &fracture, SettlementRoute::Direct, &EngineConfig::default()).unwrap();
        let amounts: Vec<f64> = plan.iter().map(|e| e.amount.value()).collect();
        assert_eq!(amounts, vec![60.0, 40.0]);
        assert_eq!(plan[1].agent.as_str(), "Bankb");
        assert!(plan[1].counterparties.is_empty());

        assert!(resynchronize(&mut ledger).unwrap());
        assert_eq!(ledger.account("Banks", "Cash").unwrap().credit(), 60.0);
        assert_eq!(ledger.account("Bankb", "Cash").unwrap().debit(), 100.0);
        check_all_micro(&ledger).unwrap();
    }

    #[test]
    fn fracture_without_funding_is_left_open() {
        let mut ledger = Ledger::new([
            agent_with_accounts("Banks", &["Deposits at Bankb", "Equity"]).unwrap(),
            agent_with_accounts("Bankb", &["Deposits from Banks", "Equity"]).unwrap(),
        ])
        .unwrap();
        corrupt(&mut ledger, "Banks", "Deposits at Bankb", Side::Debit, 25.0);

        assert!(!resynchronize(&mut ledger).unwrap());
        assert_eq!(ledger.events_processed(), 0);
        assert_eq!(detect_fractures(&ledger).len(), 1);
    }

    #[test]
    fn both_routes_resolve_an_interbank_fracture() {
        let mut ledger = standard_ledger().unwrap();
        corrupt(&mut ledger, "Banks", "Deposits at Bankb", Side::Debit, 100.0);
        let fracture = fracture_list(&ledger).remove(0);

        let paths = verify_resolution_paths(&ledger, &fracture).unwrap();
        assert!(paths.direct);
        assert!(paths.via_clearing);
        assert!(paths.is_path_independent());
        // The original books are untouched.
        assert_eq!(detect_fractures(&ledger).len(), 1);
    }

    #[test]
    fn clearing_route_moves_reserves_through_the_central_bank() {
        let mut ledger = standard_ledger().unwrap();
        corrupt(&mut ledger, "Banks", "Deposits at Bankb", Side::Debit, 100.0);
        let config = EngineConfig::default().with_route(SettlementRoute::ViaClearing);

        assert!(resynchronize_with(&mut ledger, &config).unwrap());
        assert_eq!(ledger.account("Banks", "CB Reserve").unwrap().credit(), 100.0);
        assert_eq!(ledger.account("Bankb", "CB Reserve").unwrap().debit(), 100.0);
        assert_eq!(ledger.account("CB", "Reserves of Banks").unwrap().debit(), 100.0);
        assert_eq!(ledger.account("CB", "Reserves of Bankb").unwrap().credit(), 100.0);
        check_all_micro(&ledger).unwrap();
    }

    #[test]
    fn clearing_route_is_unavailable_between_companies_and_banks() {
        let mut ledger = standard_ledger().unwrap();
        corrupt(&mut ledger, "S", "Sight Deposit at Banks", Side::Debit, 10.0);
        let fracture = fracture_list(&ledger).remove(0);
        let paths = verify_resolution_paths(&ledger, &fracture).unwrap();
        assert!(paths.direct);
        assert!(!paths.via_clearing);
    }

    proptest! {
        /// A single one-sided booking on any leg of any relationship is
        /// repaired by one pass.
        #[test]
        fn single_fracture_is_resolved(
            pair_idx in 0usize..STANDARD_RELATIONSHIPS.len(),
            on_claim in any::<bool>(),
            debit in any::<bool>(),
            quarters in 1u32..4_000_000,
        ) {
            let mut ledger = standard_ledger().unwrap();
            let pair = &STANDARD_RELATIONSHIPS[pair_idx];
            let leg = if on_claim { &pair.claim } else { &pair.liability };
            let holder = holders(&ledger, leg).next().unwrap().id_typed().to_string();
            let side = if debit { Side::Debit } else { Side::Credit };
            corrupt(&mut ledger, &holder, leg.account, side, f64::from(quarters) / 4.0);

            prop_assert_eq!(detect_fractures(&ledger).len(), 1);
            prop_assert!(resynchronize(&mut ledger).unwrap());
            prop_assert!(!detect_fractures(&ledger).contains_key(&pair.name()));
        }
    }
}
