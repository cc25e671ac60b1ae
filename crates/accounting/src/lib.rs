//! Categorical double-entry ledger.
//!
//! Agents hold T-accounts; economic events are booked as paired postings and
//! checked at two levels: every agent balances (micro) and every registered
//! debt relationship nets to zero across agents (macro). Broken relationships
//! are repaired by synthesized settlements, and linked accounts held open
//! between agents are recognized as monetary instruments.
//!
//! Pure domain logic only: no IO, no persistence concerns.

pub mod account;
pub mod agent;
pub mod chart;
pub mod colimit;
pub mod config;
pub mod diagram;
pub mod emergence;
pub mod engine;
pub mod fracture;
mod handlers;
pub mod invariance;
pub mod ledger;
pub mod processor;
pub mod report;

pub use account::{Account, AccountKind, Entry, Side, update_account};
pub use agent::Agent;
pub use chart::{classify, standard_agents, standard_ledger};
pub use colimit::{ColimitDiagram, build_colimit, verify_universal_property};
pub use config::{EngineConfig, SettlementRoute};
pub use diagram::{AccountObject, Diagram, Morphism, build_diagram, is_commutative};
pub use emergence::{
    AccountIndex, COMPLEX_LINKS, ComplexLink, InstrumentState, MoneyPattern, detect_money_emergence,
    get_money_supply, instrument_lifecycle, verify_money_emergence,
};
pub use engine::{fractures, money_supply, parse_events, run, run_with};
pub use fracture::{
    Fracture, ResolutionPaths, detect_fractures, resynchronize, resynchronize_with, verify_resolution_paths,
};
pub use invariance::{
    DebtRelationshipPair, STANDARD_RELATIONSHIPS, check_all_micro, check_boe_macro_invariance,
    check_macro_invariance, check_micro_invariance, check_relationship,
};
pub use ledger::{Ledger, Posting, TransactionRow};
pub use processor::{process_event, process_event_with};
pub use report::{BalanceSheet, balance_sheet};

pub use catledger_core::{LedgerError, LedgerResult};
