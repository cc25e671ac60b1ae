//! Shared primitives of the ledger engine: the error model, amounts and their
//! tolerance, agent identifiers, and the aggregate/entity traits.

pub mod aggregate;
pub mod amount;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use amount::{Amount, TOLERANCE, approx_eq, approx_zero};
pub use entity::{Entity, collect_unique};
pub use error::{LedgerError, LedgerResult};
pub use id::AgentId;
pub use value_object::ValueObject;
