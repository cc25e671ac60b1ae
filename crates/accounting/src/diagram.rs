//! Event diagrams: accounts as objects, money flows as morphisms.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use catledger_core::{Amount, approx_eq};
use catledger_events::EventType;

use crate::account::AccountKind;
use crate::chart::{BUYER, BUYER_BANK, CENTRAL_BANK, SELLER, SELLER_BANK};

/// Categorical label for an account inside a diagram.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountObject {
    pub agent: String,
    pub account: String,
    pub kind: AccountKind,
}

impl AccountObject {
    pub fn new(agent: impl Into<String>, account: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            agent: agent.into(),
            account: account.into(),
            kind,
        }
    }

    pub fn asset(agent: &str, account: &str) -> Self {
        Self::new(agent, account, AccountKind::Asset)
    }

    pub fn liability(agent: &str, account: &str) -> Self {
        Self::new(agent, account, AccountKind::Liability)
    }
}

impl core::fmt::Display for AccountObject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.agent, self.account)
    }
}

/// A flow of `amount` from `source` to `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Morphism {
    pub source: AccountObject,
    pub target: AccountObject,
    pub amount: Amount,
    pub date: NaiveDate,
}

/// One event as a small graph. Built and discarded per event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    event_type: EventType,
    date: NaiveDate,
    objects: Vec<AccountObject>,
    morphisms: Vec<Morphism>,
}

impl Diagram {
    pub fn new(event_type: EventType, date: NaiveDate) -> Self {
        Self {
            event_type,
            date,
            objects: Vec::new(),
            morphisms: Vec::new(),
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn objects(&self) -> &[AccountObject] {
        &self.objects
    }

    pub fn morphisms(&self) -> &[Morphism] {
        &self.morphisms
    }

    /// Add an object; objects form a set, duplicates are ignored.
    pub fn add_object(&mut self, object: AccountObject) {
        if !self.objects.contains(&object) {
            self.objects.push(object);
        }
    }

    /// Add a flow dated at the diagram's date; its endpoints join the object set.
    pub fn add_morphism(&mut self, source: AccountObject, target: AccountObject, amount: Amount) {
        self.add_object(source.clone());
        self.add_object(target.clone());
        self.morphisms.push(Morphism {
            source,
            target,
            amount,
            date: self.date,
        });
    }

    pub fn is_source(&self, object: &AccountObject) -> bool {
        self.morphisms.iter().any(|m| &m.source == object)
    }

    pub fn is_target(&self, object: &AccountObject) -> bool {
        self.morphisms.iter().any(|m| &m.target == object)
    }

    /// Objects that are both the source and the target of some flow
    /// (the middle links of a chain).
    pub fn intermediaries(&self) -> Vec<&AccountObject> {
        self.objects
            .iter()
            .filter(|o| self.is_source(o) && self.is_target(o))
            .collect()
    }
}

/// Canonical diagram of an event type.
pub fn build_diagram(event_type: EventType, amount: Amount, date: NaiveDate) -> Diagram {
    use AccountObject as O;

    let mut d = Diagram::new(event_type, date);
    match event_type {
        EventType::MoneyCreation => {
            d.add_morphism(
                O::liability(CENTRAL_BANK, "Paper Money in Circulation"),
                O::asset(CENTRAL_BANK, "Paper Money"),
                amount,
            );
        }
        EventType::InterbankLoan => {
            d.add_morphism(
                O::liability(CENTRAL_BANK, "Reserves of Banks"),
                O::asset(SELLER_BANK, "CB Reserve"),
                amount,
            );
            d.add_morphism(
                O::liability(SELLER_BANK, "Loans from CB"),
                O::asset(CENTRAL_BANK, "Loans to Banks"),
                amount,
            );
        }
        EventType::Purchase => {
            d.add_morphism(O::asset(BUYER, "Cash"), O::asset(SELLER, "Cash"), amount);
            d.add_morphism(O::asset(SELLER, "Inventory"), O::asset(BUYER, "Inventory"), amount);
        }
        EventType::BillOfExchangeCreation => {
            d.add_morphism(O::asset(SELLER, "Inventory"), O::asset(BUYER, "Inventory"), amount);
            d.add_morphism(
                O::liability(BUYER, "Liability from BOE"),
                O::asset(SELLER, "Receivable from BOE"),
                amount,
            );
        }
        EventType::BillOfExchangeTransfer => {
            d.add_morphism(
                O::asset(SELLER, "Receivable from BOE"),
                O::asset(SELLER_BANK, "Receivable from BOE"),
                amount,
            );
            d.add_morphism(
                O::liability(SELLER_BANK, "Sight Deposits of S"),
                O::asset(SELLER, "Sight Deposit at Banks"),
                amount,
            );
        }
        EventType::Settlement => {
            // Payer's deposit → payer bank → clearing agent → payee bank.
            let payer = O::asset(BUYER, "Sight Deposit at Bankb");
            let payer_bank = O::liability(BUYER_BANK, "Deposits from Banks");
            let clearing = O::liability(CENTRAL_BANK, "Reserves of Banks");
            let payee_bank = O::asset(SELLER_BANK, "Deposits at Bankb");
            d.add_morphism(payer, payer_bank.clone(), amount);
            d.add_morphism(payer_bank, clearing.clone(), amount);
            d.add_morphism(clearing, payee_bank, amount);
        }
    }
    d
}

/// Parallel morphisms (same source and target) must carry equal amounts.
pub fn is_commutative(diagram: &Diagram) -> bool {
    let ms = diagram.morphisms();
    ms.iter().enumerate().all(|(i, a)| {
        ms[i + 1..]
            .iter()
            .filter(|b| a.source == b.source && a.target == b.target)
            .all(|b| approx_eq(a.amount.value(), b.amount.value()))
    })
}
