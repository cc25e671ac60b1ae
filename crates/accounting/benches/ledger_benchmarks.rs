use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::NaiveDate;

use catledger_accounting::{Ledger, detect_fractures, detect_money_emergence, get_money_supply, run};
use catledger_core::{AgentId, Amount};
use catledger_events::{EconomicEvent, EventType};

fn event(t: EventType, date: NaiveDate, agent: &str, cps: &[&str], accounts: &[&str], v: f64) -> EconomicEvent {
    let mut e = EconomicEvent::new(t, date, AgentId::new(agent).unwrap(), Amount::new(v).unwrap())
        .with_accounts(accounts.iter().copied());
    for cp in cps {
        e = e.with_counterparty(AgentId::new(*cp).unwrap());
    }
    e
}

/// `cycles` rounds of money creation, two loans and a full bill lifecycle.
fn stream(cycles: usize) -> Vec<EconomicEvent> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut events = Vec::with_capacity(cycles * 6);
    for i in 0..cycles {
        let date = start + chrono::Days::new(i as u64);
        let v = 100.0 + (i % 7) as f64;
        events.push(event(
            EventType::MoneyCreation,
            date,
            "CB",
            &[],
            &["Paper Money", "Paper Money in Circulation"],
            v,
        ));
        for bank in ["Banks", "Bankb"] {
            events.push(event(
                EventType::InterbankLoan,
                date,
                "CB",
                &[bank],
                &[&format!("Loans to {bank}"), &format!("Reserves of {bank}"), "CB Reserve", "Loans from CB"],
                v,
            ));
        }
        events.push(event(
            EventType::BillOfExchangeCreation,
            date,
            "S",
            &["B"],
            &["Receivable from BOE", "Inventory", "Inventory", "Liability from BOE"],
            v,
        ));
        events.push(event(
            EventType::BillOfExchangeTransfer,
            date,
            "S",
            &["Banks"],
            &["Sight Deposit at Banks", "Receivable from BOE", "Receivable from BOE", "Sight Deposits of S"],
            v,
        ));
        events.push(event(
            EventType::Settlement,
            date,
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
            v,
        ));
    }
    events
}

fn bench_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("run");
    for cycles in [10usize, 100, 500] {
        let events = stream(cycles);
        group.throughput(Throughput::Elements(events.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(cycles), &events, |b, events| {
            b.iter(|| run(black_box(events)).unwrap())
        });
    }
    group.finish();
}

fn bench_snapshot_scans(c: &mut Criterion) {
    let ledger: Ledger = run(&stream(100)).unwrap();
    let mut group = c.benchmark_group("snapshot");
    group.bench_function("detect_money_emergence", |b| {
        b.iter(|| detect_money_emergence(black_box(&ledger)))
    });
    group.bench_function("get_money_supply", |b| b.iter(|| get_money_supply(black_box(&ledger))));
    group.bench_function("detect_fractures", |b| b.iter(|| detect_fractures(black_box(&ledger))));
    group.finish();
}

criterion_group!(benches, bench_run, bench_snapshot_scans);
criterion_main!(benches);
