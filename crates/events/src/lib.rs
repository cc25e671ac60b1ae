//! Economic events: the input records of the ledger engine.

pub mod event;
pub mod handler;

pub use event::{EconomicEvent, Event, EventType};
pub use handler::execute;
