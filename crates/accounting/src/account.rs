//! T-accounts: debit/credit accumulators with a full audit trail.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use catledger_core::{Amount, Entity};

/// Balance-sheet classification (determines normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Asset,
    Liability,
}

/// Side of a T-account a booking lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Debit,
    Credit,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Debit => Side::Credit,
            Side::Credit => Side::Debit,
        }
    }
}

/// One line of an account's audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub date: NaiveDate,
    pub amount: Amount,
    pub side: Side,
}

/// A named T-account.
///
/// Accumulators only grow; an account is never deleted, so its entries stay
/// available after the instrument it records has been settled to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    name: String,
    kind: Option<AccountKind>,
    debit: f64,
    credit: f64,
    entries: Vec<Entry>,
}

impl Account {
    pub fn new(name: impl Into<String>, kind: Option<AccountKind>) -> Self {
        Self {
            name: name.into(),
            kind,
            debit: 0.0,
            credit: 0.0,
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` for accounts outside the asset/liability registry (e.g. equity).
    pub fn kind(&self) -> Option<AccountKind> {
        self.kind
    }

    pub fn debit(&self) -> f64 {
        self.debit
    }

    pub fn credit(&self) -> f64 {
        self.credit
    }

    /// Debit minus credit.
    pub fn net(&self) -> f64 {
        self.debit - self.credit
    }

    /// Balance on the account's normal side (credit-normal for liabilities).
    pub fn balance(&self) -> f64 {
        match self.kind {
            Some(AccountKind::Liability) => self.credit - self.debit,
            _ => self.debit - self.credit,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Never booked.
    pub fn is_untouched(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Entity for Account {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.name
    }
}

/// Book `amount` on one side of `account`.
///
/// No invariant validation here: keeping debits and credits paired is the
/// event processor's job.
pub fn update_account(account: &mut Account, amount: Amount, side: Side, date: NaiveDate) {
    match side {
        Side::Debit => account.debit += amount.value(),
        Side::Credit => account.credit += amount.value(),
    }
    account.entries.push(Entry { date, amount, side });
}
