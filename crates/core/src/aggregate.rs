//! Aggregate root traits for the ledger and anything else that books changes.
//!
//! State moves in two steps: an input is first *decided* into a list of
//! changes, then each change is *applied*. Only the second step touches state.

/// Aggregate root marker + minimal interface.
///
/// Kept small so the ledger can model its own transitions (postings, account
/// updates) without pulling in processing or reporting concerns.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing version of the aggregate's state.
    ///
    /// Counts the changes applied so far. A rejected input leaves it where it
    /// was, so comparing versions before and after a call tells whether
    /// anything was booked.
    fn version(&self) -> u64;
}

/// Aggregate execution semantics (pure, deterministic).
///
/// - **Decision logic**: `decide(&self, input)` validates an input and returns
///   the changes it implies.
/// - **State mutation**: `apply(&mut self, change)` books one change.
///
/// ## Why `decide` is pure
///
/// Every check an input must pass (known agent, known account, balanced
/// postings) runs in `decide` against a shared borrow. If any check fails the
/// error is returned before a single change exists, so the aggregate is left
/// exactly as it was. There is nothing to roll back, and a half-booked event
/// cannot be observed.
///
/// ## Why `apply` cannot fail
///
/// Changes handed to `apply` have already been validated by `decide` against
/// the same state. Applying them is bookkeeping only, so it returns nothing:
/// a fallible `apply` would mean some changes of one input could land while
/// later ones were refused, which is the partial state `decide` exists to
/// rule out.
///
/// Aggregates must not perform IO or side effects in either step.
pub trait Aggregate: AggregateRoot {
    type Input: Clone + core::fmt::Debug;
    type Change: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Decide which changes an input implies given the current state.
    ///
    /// This must not mutate state. State evolution is done through `apply`.
    fn decide(&self, input: &Self::Input) -> Result<Vec<Self::Change>, Self::Error>;

    /// Evolve in-memory state from a single change.
    ///
    /// Implementations should stay deterministic and bump `version()` by one
    /// per applied change.
    fn apply(&mut self, change: &Self::Change);
}
