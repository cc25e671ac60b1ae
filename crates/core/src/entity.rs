//! Entities: things with a stable name whose state changes over a run.

use std::collections::BTreeMap;

use crate::error::{LedgerError, LedgerResult};

/// Agents and accounts are entities: their balances change, but they stay the
/// same agent/account by name.
pub trait Entity {
    type Id: Clone + Ord + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;
}

/// Index entities by id, rejecting a second entity with an id already seen.
///
/// `scope` names the container in the error message (e.g. `"agent CB"`).
pub fn collect_unique<E: Entity>(
    items: impl IntoIterator<Item = E>,
    scope: &str,
) -> LedgerResult<BTreeMap<E::Id, E>> {
    let mut map = BTreeMap::new();
    for item in items {
        let id = item.id().clone();
        if map.contains_key(&id) {
            return Err(LedgerError::validation(format!("{scope} declares {id} twice")));
        }
        map.insert(id, item);
    }
    Ok(map)
}
