//! Batch entry points: replay an ordered event stream into a ledger.

use std::collections::BTreeMap;

use catledger_core::{LedgerError, LedgerResult};
use catledger_events::EconomicEvent;

use crate::chart::standard_ledger;
use crate::config::EngineConfig;
use crate::emergence::get_money_supply;
use crate::fracture::detect_fractures;
use crate::ledger::Ledger;
use crate::processor::process_event_with;

/// Replay `events` over the standard chart under the default configuration.
pub fn run(events: &[EconomicEvent]) -> LedgerResult<Ledger> {
    run_with(standard_ledger()?, events, &EngineConfig::default())
}

/// Replay `events` over `ledger`, stopping at the first error.
///
/// Events already applied stay applied; the returned error is the only
/// record of where the run stopped.
pub fn run_with(mut ledger: Ledger, events: &[EconomicEvent], config: &EngineConfig) -> LedgerResult<Ledger> {
    config.validate()?;
    for (i, event) in events.iter().enumerate() {
        process_event_with(&mut ledger, event, config).inspect_err(|err| {
            tracing::error!(index = i, event_type = %event.event_type, error = %err, "run halted");
        })?;
    }
    tracing::info!(
        events = events.len(),
        bookings = ledger.journal().len(),
        "run complete"
    );
    Ok(ledger)
}

/// Parse an event stream from a JSON array.
pub fn parse_events(json: &str) -> LedgerResult<Vec<EconomicEvent>> {
    serde_json::from_str(json).map_err(|e| LedgerError::validation(format!("malformed event stream: {e}")))
}

pub fn money_supply(ledger: &Ledger) -> BTreeMap<String, f64> {
    get_money_supply(ledger)
}

pub fn fractures(ledger: &Ledger) -> BTreeMap<String, f64> {
    detect_fractures(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariance::{check_all_micro, check_macro_invariance};

    const STREAM: &str = r#"[
        {"event_type":"money_creation","date":"2024-01-01","agent":"CB",
         "accounts":["Paper Money","Paper Money in Circulation"],"amount":1000.0},
        {"event_type":"interbank_loan","date":"2024-01-02","agent":"CB","counterparties":["Banks"],
         "accounts":["Loans to Banks","Reserves of Banks","CB Reserve","Loans from CB"],"amount":200.0},
        {"event_type":"purchase","date":"2024-01-03","agent":"B","counterparties":["S"],
         "accounts":["Inventory","Cash","Cash","Inventory"],"amount":50.0}
    ]"#;

    #[test]
    fn json_stream_replays_into_balanced_books() {
        let events = parse_events(STREAM).unwrap();
        assert_eq!(events.len(), 3);
        assert!(events[0].counterparties.is_empty());

        let ledger = run(&events).unwrap();
        assert_eq!(ledger.events_processed(), 3);
        assert_eq!(ledger.journal().len(), 10);
        check_all_micro(&ledger).unwrap();
        check_macro_invariance(&ledger).unwrap();
        assert!(fractures(&ledger).is_empty());
        assert!(money_supply(&ledger).values().all(|v| *v == 0.0));
    }

    #[test]
    fn run_stops_at_the_first_failing_event() {
        let mut events = parse_events(STREAM).unwrap();
        events.swap(0, 2);
        let err = run(&events).unwrap_err();
        assert!(matches!(err, LedgerError::OutOfOrder { .. }));
    }

    #[test]
    fn invalid_config_is_rejected_before_any_event() {
        let events = parse_events(STREAM).unwrap();
        let config = EngineConfig {
            clearing_agent: String::new(),
            ..EngineConfig::default()
        };
        let err = run_with(standard_ledger().unwrap(), &events, &config).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn malformed_stream_is_a_validation_error() {
        assert!(matches!(parse_events("[{"), Err(LedgerError::Validation(_))));
        assert!(matches!(
            parse_events(r#"[{"event_type":"barter","date":"2024-01-01","agent":"B","accounts":[],"amount":1}]"#),
            Err(LedgerError::Validation(_))
        ));
    }
}
