//! Colimit construction over an event diagram.
//!
//! The colimit is a synthetic `System.Balance` object receiving one universal
//! morphism from every diagram object: the event's system-wide effect.

use serde::{Deserialize, Serialize};

use catledger_core::approx_eq;

use crate::account::AccountKind;
use crate::diagram::{AccountObject, Diagram};

pub const COLIMIT_AGENT: &str = "System";
pub const COLIMIT_ACCOUNT: &str = "Balance";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversalMorphism {
    pub source: AccountObject,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColimitDiagram {
    pub base: Diagram,
    pub colimit: AccountObject,
    pub universal: Vec<UniversalMorphism>,
}

impl ColimitDiagram {
    pub fn universal_amount(&self, object: &AccountObject) -> Option<f64> {
        self.universal
            .iter()
            .find(|u| &u.source == object)
            .map(|u| u.amount)
    }
}

/// Build the colimit of `diagram`.
///
/// Universal amount per object: its outgoing flow if it is only a source,
/// its incoming flow if it is only a target, 0 when isolated. An object that
/// is both source and target (chain intermediary) also gets 0.
pub fn build_colimit(diagram: &Diagram) -> ColimitDiagram {
    let universal = diagram
        .objects()
        .iter()
        .map(|object| {
            let outgoing = diagram.morphisms().iter().find(|m| &m.source == object);
            let incoming = diagram.morphisms().iter().find(|m| &m.target == object);
            let amount = match (outgoing, incoming) {
                (Some(out), None) => out.amount.value(),
                (None, Some(inc)) => inc.amount.value(),
                _ => 0.0,
            };
            UniversalMorphism {
                source: object.clone(),
                amount,
            }
        })
        .collect();

    ColimitDiagram {
        base: diagram.clone(),
        colimit: AccountObject::new(COLIMIT_AGENT, COLIMIT_ACCOUNT, AccountKind::Asset),
        universal,
    }
}

/// Every base flow `m` must factor through the colimit:
/// universal(m.source) == universal(m.target) == m.amount.
pub fn verify_universal_property(colimit: &ColimitDiagram) -> bool {
    colimit.base.morphisms().iter().all(|m| {
        let a = m.amount.value();
        let via_source = colimit.universal_amount(&m.source);
        let via_target = colimit.universal_amount(&m.target);
        matches!((via_source, via_target), (Some(s), Some(t)) if approx_eq(s, a) && approx_eq(t, a))
    })
}
