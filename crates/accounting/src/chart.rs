//! Standard chart of accounts and the fixed asset/liability registry.
//!
//! The economy is five agents: a central bank that also clears interbank
//! payments, the seller's bank (`Banks`), the buyer's bank (`Bankb`), a
//! seller (`S`) and a buyer (`B`).

use catledger_core::{AgentId, LedgerResult};

use crate::account::{Account, AccountKind};
use crate::agent::Agent;
use crate::ledger::Ledger;

pub const CENTRAL_BANK: &str = "CB";
pub const SELLER_BANK: &str = "Banks";
pub const BUYER_BANK: &str = "Bankb";
pub const SELLER: &str = "S";
pub const BUYER: &str = "B";

pub const PAPER_MONEY: &str = "Paper Money";
pub const PAPER_MONEY_IN_CIRCULATION: &str = "Paper Money in Circulation";
pub const CASH: &str = "Cash";
pub const CB_RESERVE: &str = "CB Reserve";
pub const LOANS_FROM_CB: &str = "Loans from CB";
pub const INVENTORY: &str = "Inventory";
pub const EQUITY: &str = "Equity";
pub const RECEIVABLE_FROM_BOE: &str = "Receivable from BOE";
pub const LIABILITY_FROM_BOE: &str = "Liability from BOE";

const ASSETS: &[&str] = &[
    PAPER_MONEY,
    "Loans to Banks",
    "Loans to Bankb",
    CASH,
    CB_RESERVE,
    "Deposits at Bankb",
    "Deposits at Banks",
    RECEIVABLE_FROM_BOE,
    INVENTORY,
    "Sight Deposit at Banks",
    "Sight Deposit at Bankb",
];

const LIABILITIES: &[&str] = &[
    PAPER_MONEY_IN_CIRCULATION,
    "Reserves of Banks",
    "Reserves of Bankb",
    LOANS_FROM_CB,
    "Deposits from Bankb",
    "Deposits from Banks",
    "Sight Deposits of S",
    "Sight Deposits of B",
    LIABILITY_FROM_BOE,
];

/// Classify an account name against the fixed registry.
///
/// Names outside the registry (equity) are not balance-sheet lines.
pub fn classify(account: &str) -> Option<AccountKind> {
    if ASSETS.contains(&account) {
        Some(AccountKind::Asset)
    } else if LIABILITIES.contains(&account) {
        Some(AccountKind::Liability)
    } else {
        None
    }
}

/// Name of the claim a lender books against `borrower`.
pub fn loans_to(borrower: &str) -> String {
    format!("Loans to {borrower}")
}

/// Name of the reserve liability the central bank owes `bank`.
pub fn reserves_of(bank: &str) -> String {
    format!("Reserves of {bank}")
}

const STANDARD_CHART: &[(&str, &[&str])] = &[
    (
        CENTRAL_BANK,
        &[
            PAPER_MONEY,
            PAPER_MONEY_IN_CIRCULATION,
            "Loans to Banks",
            "Loans to Bankb",
            "Reserves of Banks",
            "Reserves of Bankb",
        ],
    ),
    (
        SELLER_BANK,
        &[
            CASH,
            CB_RESERVE,
            "Deposits at Bankb",
            RECEIVABLE_FROM_BOE,
            LOANS_FROM_CB,
            "Deposits from Bankb",
            "Sight Deposits of S",
            EQUITY,
        ],
    ),
    (
        BUYER_BANK,
        &[
            CASH,
            CB_RESERVE,
            "Deposits at Banks",
            LOANS_FROM_CB,
            "Deposits from Banks",
            "Sight Deposits of B",
            EQUITY,
        ],
    ),
    (
        SELLER,
        &[CASH, INVENTORY, "Sight Deposit at Banks", RECEIVABLE_FROM_BOE, EQUITY],
    ),
    (
        BUYER,
        &[CASH, INVENTORY, "Sight Deposit at Bankb", LIABILITY_FROM_BOE, EQUITY],
    ),
];

/// Build one agent with zero-balance accounts classified by the registry.
pub fn agent_with_accounts(name: &str, accounts: &[&str]) -> LedgerResult<Agent> {
    Agent::new(
        AgentId::new(name)?,
        accounts.iter().map(|a| Account::new(*a, classify(a))),
    )
}

/// The five agents of the standard economy.
pub fn standard_agents() -> LedgerResult<Vec<Agent>> {
    STANDARD_CHART
        .iter()
        .map(|(name, accounts)| agent_with_accounts(name, accounts))
        .collect()
}

/// An empty ledger over the standard economy.
pub fn standard_ledger() -> LedgerResult<Ledger> {
    Ledger::new(standard_agents()?)
}
