//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**: they are defined entirely by their
//! attribute values, and two with the same values are interchangeable.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: `Amount(100.0)` is the same as any other `Amount(100.0)`.
///   A flow of 100 booked to one account is indistinguishable from a flow of
///   100 booked to another.
/// - **Entity**: an `Agent` or `Account` is tracked by its name. Two accounts
///   holding the same balance are still two accounts.
///
/// ## Immutability
///
/// A value object never changes after construction. Anything that needs a
/// different value builds a new one, which is how `Amount` keeps its
/// validation in a single constructor: once an `Amount` exists it is finite
/// and non-negative, and can be copied around freely.
///
/// ## Design Constraints
///
/// - **Clone**: values are cheap to copy.
/// - **PartialEq**: comparison is by attribute values.
/// - **Debug**: values show up in logs and test failures.
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// struct Amount(f64);
///
/// impl ValueObject for Amount {}
///
/// // Equal by value, not identity
/// assert_eq!(Amount(100.0), Amount(100.0));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
