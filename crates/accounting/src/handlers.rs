//! Event handlers: the closed dispatch table from event type to postings.
//!
//! Every handler resolves its roles (primary agent + counterparties) and
//! account positions, and emits postings that leave each touched agent's
//! books balanced. Handlers decide only; the ledger applies.

use catledger_core::{AgentId, LedgerError, LedgerResult, approx_zero};
use catledger_events::{EconomicEvent, EventType};

use crate::account::Side;
use crate::chart::{LIABILITY_FROM_BOE, RECEIVABLE_FROM_BOE};
use crate::ledger::{Ledger, Posting};

/// Roles of a paired event: each role books one (debit, credit) pair.
struct Shape {
    roles: &'static [&'static str],
    /// (position in `accounts`, required account name)
    fixed: &'static [(usize, &'static str)],
}

const MONEY_CREATION: Shape = Shape {
    roles: &["issuer"],
    fixed: &[],
};

const INTERBANK_LOAN: Shape = Shape {
    roles: &["lender", "borrower"],
    fixed: &[],
};

const PURCHASE: Shape = Shape {
    roles: &["buyer", "seller"],
    fixed: &[],
};

const BOE_CREATION: Shape = Shape {
    roles: &["drawer", "drawee"],
    fixed: &[(0, RECEIVABLE_FROM_BOE), (3, LIABILITY_FROM_BOE)],
};

const BOE_TRANSFER: Shape = Shape {
    roles: &["holder", "new holder"],
    fixed: &[(1, RECEIVABLE_FROM_BOE), (2, RECEIVABLE_FROM_BOE)],
};

const PAIRED_SETTLEMENT: Shape = Shape {
    roles: &["payer", "payer bank", "payee bank"],
    fixed: &[],
};

const COMPLETION: Shape = Shape {
    roles: &["holder"],
    fixed: &[],
};

pub(crate) fn decide(ledger: &Ledger, event: &EconomicEvent) -> LedgerResult<Vec<Posting>> {
    event.validate()?;

    let postings = match event.event_type {
        EventType::MoneyCreation => paired(event, &MONEY_CREATION)?,
        EventType::InterbankLoan => paired(event, &INTERBANK_LOAN)?,
        EventType::Purchase => paired(event, &PURCHASE)?,
        EventType::BillOfExchangeCreation => paired(event, &BOE_CREATION)?,
        EventType::BillOfExchangeTransfer => paired(event, &BOE_TRANSFER)?,
        EventType::Settlement => settlement(ledger, event)?,
    };

    for posting in &postings {
        ledger.require_account(posting.agent.as_str(), &posting.account)?;
    }
    Ok(postings)
}

fn posting(event: &EconomicEvent, agent: &AgentId, account: &str, side: Side) -> Posting {
    Posting {
        event_type: event.event_type,
        date: event.date,
        agent: agent.clone(),
        account: account.to_string(),
        side,
        amount: event.amount,
    }
}

fn paired(event: &EconomicEvent, shape: &Shape) -> LedgerResult<Vec<Posting>> {
    let agents: Vec<&AgentId> = event.agents().collect();
    if agents.len() != shape.roles.len() {
        return Err(LedgerError::validation(format!(
            "{} needs {} agent(s) ({}), got {}",
            event.event_type,
            shape.roles.len(),
            shape.roles.join(", "),
            agents.len()
        )));
    }
    if event.accounts.len() != 2 * shape.roles.len() {
        return Err(LedgerError::validation(format!(
            "{} needs {} account names, got {}",
            event.event_type,
            2 * shape.roles.len(),
            event.accounts.len()
        )));
    }
    for (pos, required) in shape.fixed {
        if event.accounts[*pos] != *required {
            return Err(LedgerError::validation(format!(
                "{}: account {} must be {required}, got {}",
                event.event_type, pos, event.accounts[*pos]
            )));
        }
    }

    let mut postings = Vec::with_capacity(event.accounts.len());
    for (agent, pair) in agents.iter().zip(event.accounts.chunks_exact(2)) {
        postings.push(posting(event, agent, &pair[0], Side::Debit));
        postings.push(posting(event, agent, &pair[1], Side::Credit));
    }
    Ok(postings)
}

/// Settlements come in three shapes:
///
/// - paired: payer, payer bank and payee bank each book a (debit, credit) pair;
/// - fracture settlement: the originator of a one-sided booking completes it
///   with a single entry on its funding account, the counterparty (and an
///   optional clearing agent) book balanced pairs;
/// - completion: a single holder books the missing leg of a relationship
///   against its own funding account.
fn settlement(ledger: &Ledger, event: &EconomicEvent) -> LedgerResult<Vec<Posting>> {
    match (event.counterparties.len(), event.accounts.len()) {
        (2, 6) => paired(event, &PAIRED_SETTLEMENT),
        (0, 2) => paired(event, &COMPLETION),
        (1, 3) | (2, 5) => fracture_settlement(ledger, event),
        (cps, accounts) => Err(LedgerError::validation(format!(
            "settlement shape not recognised ({cps} counterparties, {accounts} accounts)"
        ))),
    }
}

fn fracture_settlement(ledger: &Ledger, event: &EconomicEvent) -> LedgerResult<Vec<Posting>> {
    let originator = &event.agent;
    let open = ledger.require_agent(originator.as_str())?.imbalance();
    if approx_zero(open) {
        return Err(LedgerError::validation(format!(
            "settlement originator {originator} has no open imbalance"
        )));
    }
    let heavy_side = if open > 0.0 { Side::Debit } else { Side::Credit };
    let closing_side = heavy_side.opposite();

    let mut postings = vec![posting(event, originator, &event.accounts[0], closing_side)];
    for (agent, pair) in event.counterparties.iter().zip(event.accounts[1..].chunks_exact(2)) {
        postings.push(posting(event, agent, &pair[0], Side::Debit));
        postings.push(posting(event, agent, &pair[1], Side::Credit));
    }
    Ok(postings)
}
