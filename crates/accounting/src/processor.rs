//! Event processor: diagram checks, booking, then invariant enforcement.

use std::collections::BTreeSet;

use catledger_core::{AgentId, LedgerError, LedgerResult, approx_zero};
use catledger_events::{EconomicEvent, Event, execute};

use crate::colimit::{build_colimit, verify_universal_property};
use crate::config::EngineConfig;
use crate::diagram::{build_diagram, is_commutative};
use crate::fracture::detect_fractures;
use crate::invariance::{check_macro_invariance, check_micro_invariance};
use crate::ledger::{Ledger, Posting};

/// Process one event under the default configuration.
pub fn process_event(ledger: &mut Ledger, event: &EconomicEvent) -> LedgerResult<Vec<Posting>> {
    process_event_with(ledger, event, &EngineConfig::default())
}

/// Apply `event` and verify the ledger afterwards.
///
/// Fail-fast: any violation is returned immediately and nothing is rolled
/// back. A violation here means the handler (or the input) is wrong, not that
/// the ledger is transiently unbalanced.
pub fn process_event_with(
    ledger: &mut Ledger,
    event: &EconomicEvent,
    config: &EngineConfig,
) -> LedgerResult<Vec<Posting>> {
    if let Some(last) = ledger.last_date() {
        if event.date < last {
            return Err(LedgerError::OutOfOrder {
                last: last.to_string(),
                found: event.date.to_string(),
            });
        }
    }

    check_event_diagram(event, config)?;

    let baseline = detect_fractures(ledger);
    let postings = execute(ledger, event)?;
    ledger.record_event(event.date);

    tracing::debug!(
        event_type = event.event_type(),
        date = %event.date,
        postings = postings.len(),
        "event booked"
    );

    let touched: BTreeSet<&AgentId> = postings.iter().map(|p| &p.agent).collect();
    for id in touched {
        let agent = ledger.require_agent(id.as_str())?;
        if !check_micro_invariance(agent) {
            tracing::error!(agent = %id, imbalance = agent.imbalance(), "micro invariance violated");
            return Err(LedgerError::MicroInvarianceViolation {
                agent: id.to_string(),
                imbalance: agent.imbalance(),
            });
        }
    }

    if baseline.is_empty() {
        check_macro_invariance(ledger).inspect_err(|err| {
            tracing::error!(error = %err, "macro invariance violated");
        })?;
    } else {
        // Books were already fractured: the event may heal, never widen.
        for (relationship, imbalance) in detect_fractures(ledger) {
            let before = baseline.get(&relationship).copied().unwrap_or(0.0);
            if imbalance.abs() > before.abs() && !approx_zero(imbalance.abs() - before.abs()) {
                tracing::error!(%relationship, imbalance, before, "event widened a fracture");
                return Err(LedgerError::MacroInvarianceViolation {
                    relationship,
                    imbalance,
                });
            }
        }
    }

    tracing::info!(
        event_type = event.event_type(),
        date = %event.date,
        agent = %event.agent,
        amount = event.amount.value(),
        "event processed"
    );
    Ok(postings)
}

fn check_event_diagram(event: &EconomicEvent, config: &EngineConfig) -> LedgerResult<()> {
    let diagram = build_diagram(event.event_type, event.amount, event.date);
    if !is_commutative(&diagram) {
        return Err(LedgerError::structural(format!(
            "{} diagram does not commute",
            event.event_type
        )));
    }

    let colimit = build_colimit(&diagram);
    if verify_universal_property(&colimit) {
        return Ok(());
    }

    let intermediaries = diagram.intermediaries();
    if intermediaries.is_empty() || config.strict_colimits {
        return Err(LedgerError::structural(format!(
            "{} colimit fails its universal property",
            event.event_type
        )));
    }
    tracing::warn!(
        event_type = event.event_type(),
        intermediaries = intermediaries.len(),
        "colimit universal property unverified for chain intermediaries"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Side;
    use crate::chart::standard_ledger;
    use crate::invariance::check_all_micro;
    use catledger_core::Amount;
    use catledger_events::EventType;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn ev(t: EventType, day: u32, agent: &str, cps: &[&str], accounts: &[&str], v: f64) -> EconomicEvent {
        let mut e = EconomicEvent::new(t, date(day), AgentId::new(agent).unwrap(), Amount::new(v).unwrap())
            .with_accounts(accounts.iter().copied());
        for cp in cps {
            e = e.with_counterparty(AgentId::new(*cp).unwrap());
        }
        e
    }

    fn money(day: u32, v: f64) -> EconomicEvent {
        ev(EventType::MoneyCreation, day, "CB", &[], &["Paper Money", "Paper Money in Circulation"], v)
    }

    fn loan(day: u32, bank: &str, v: f64) -> EconomicEvent {
        let claim = format!("Loans to {bank}");
        let reserves = format!("Reserves of {bank}");
        ev(
            EventType::InterbankLoan,
            day,
            "CB",
            &[bank],
            &[&claim, &reserves, "CB Reserve", "Loans from CB"],
            v,
        )
    }

    fn purchase(day: u32, v: f64) -> EconomicEvent {
        ev(EventType::Purchase, day, "B", &["S"], &["Inventory", "Cash", "Cash", "Inventory"], v)
    }

    #[test]
    fn out_of_order_event_is_rejected() {
        let mut ledger = standard_ledger().unwrap();
        process_event(&mut ledger, &money(5, 10.0)).unwrap();
        let err = process_event(&mut ledger, &money(4, 10.0)).unwrap_err();
        assert!(matches!(err, LedgerError::OutOfOrder { .. }));
        process_event(&mut ledger, &money(5, 10.0)).unwrap();
        assert_eq!(ledger.events_processed(), 2);
    }

    #[test]
    fn unmatched_input_accounts_halt_with_macro_violation() {
        let mut ledger = standard_ledger().unwrap();
        // Balanced for the agent, but books a claim nobody owes.
        let bad = ev(EventType::MoneyCreation, 1, "Banks", &[], &["Deposits at Bankb", "Equity"], 40.0);
        let err = process_event(&mut ledger, &bad).unwrap_err();
        assert_eq!(
            err,
            LedgerError::MacroInvarianceViolation {
                relationship: "Deposits at Bankb ↔ Deposits from Banks".into(),
                imbalance: 40.0,
            }
        );
    }

    #[test]
    fn settlement_passes_with_lenient_colimits_and_fails_strictly() {
        let settle = ev(
            EventType::Settlement,
            1,
            "B",
            &["Bankb", "Banks"],
            &[
                "Liability from BOE",
                "Sight Deposit at Bankb",
                "Sight Deposits of B",
                "Deposits from Banks",
                "Deposits at Bankb",
                "Receivable from BOE",
            ],
            10.0,
        );
        let mut ledger = standard_ledger().unwrap();
        process_event(&mut ledger, &settle).unwrap();

        let strict = EngineConfig {
            strict_colimits: true,
            ..EngineConfig::default()
        };
        let mut ledger = standard_ledger().unwrap();
        let err = process_event_with(&mut ledger, &settle, &strict).unwrap_err();
        assert!(matches!(err, LedgerError::Structural(_)));
        assert!(ledger.journal().is_empty());
    }

    #[test]
    fn event_on_fractured_books_may_not_widen_the_fracture() {
        let mut ledger = standard_ledger().unwrap();
        ledger
            .update_account("Banks", "Deposits at Bankb", Amount::new(100.0).unwrap(), Side::Debit, date(1))
            .unwrap();
        // Unrelated events are fine.
        process_event(&mut ledger, &money(2, 10.0)).unwrap();

        let noop = ev(EventType::MoneyCreation, 3, "Bankb", &[], &["Equity", "Deposits from Banks"], 0.0);
        process_event(&mut ledger, &noop).unwrap();

        let widen = ev(EventType::MoneyCreation, 3, "Bankb", &[], &["Deposits from Banks", "Equity"], 5.0);
        assert!(matches!(
            process_event(&mut ledger, &widen),
            Err(LedgerError::MacroInvarianceViolation { .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Any mix of well-formed events leaves every agent and every
        /// relationship balanced.
        #[test]
        fn event_sequences_preserve_both_invariants(
            steps in prop::collection::vec((0u8..3, (0u32..4_000_000).prop_map(|q| f64::from(q) / 4.0)), 1..30)
        ) {
            let mut ledger = standard_ledger().unwrap();
            for (i, (kind, v)) in steps.into_iter().enumerate() {
                let day = 1 + (i as u32 % 28);
                let day = day.max(ledger.last_date().map_or(1, |d| chrono::Datelike::day(&d)));
                let event = match kind {
                    0 => money(day, v),
                    1 => loan(day, if i % 2 == 0 { "Banks" } else { "Bankb" }, v),
                    _ => purchase(day, v),
                };
                process_event(&mut ledger, &event).unwrap();
            }
            prop_assert!(check_all_micro(&ledger).is_ok());
            prop_assert!(check_macro_invariance(&ledger).is_ok());
            prop_assert!(detect_fractures(&ledger).is_empty());
        }
    }
}
