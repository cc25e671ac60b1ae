//! Ledger error model.

use thiserror::Error;

/// Result type used across the ledger engine.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Engine-level error.
///
/// Invariant violations are raised at detection and are fatal for the run:
/// there is no rollback, so the ledger state must be treated as untrustworthy
/// until it has been repaired (`resynchronize`) and re-verified.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    /// Malformed diagram (non-commuting morphisms, broken universal property).
    /// Indicates a bug in event-to-diagram translation.
    #[error("structural error: {0}")]
    Structural(String),

    /// An agent's own books do not balance after an event.
    #[error("micro invariance violated for agent {agent}: debits exceed credits by {imbalance}")]
    MicroInvarianceViolation { agent: String, imbalance: f64 },

    /// A registered debt relationship does not net to zero.
    #[error("macro invariance violated for relationship {relationship}: net position {imbalance}")]
    MacroInvarianceViolation { relationship: String, imbalance: f64 },

    /// A detected money pattern is not backed (its accounts do not net to zero).
    ///
    /// Non-fatal: reported and excluded from money-supply aggregation.
    #[error("emergence inconsistency for {property}: pattern nets to {imbalance}")]
    EmergenceInconsistency { property: String, imbalance: f64 },

    /// A value failed validation (e.g. malformed event record).
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("unknown account {account} for agent {agent}")]
    UnknownAccount { agent: String, account: String },

    /// Events must be applied in non-decreasing date order.
    #[error("event out of order (last={last}, found={found})")]
    OutOfOrder { last: String, found: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl LedgerError {
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown_account(agent: impl Into<String>, account: impl Into<String>) -> Self {
        Self::UnknownAccount {
            agent: agent.into(),
            account: account.into(),
        }
    }

    /// True for the invariant family (micro, macro, structural) that halts a run.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::Structural(_)
                | Self::MicroInvarianceViolation { .. }
                | Self::MacroInvarianceViolation { .. }
        )
    }
}
