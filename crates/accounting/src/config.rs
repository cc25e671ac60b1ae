//! Engine configuration.

use serde::{Deserialize, Serialize};

use catledger_core::{LedgerError, LedgerResult};

use crate::chart::CENTRAL_BANK;

/// How a resynchronization settlement moves money between the two holders of
/// a fractured relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementRoute {
    /// Bilateral transfer of cash (paper money) between the holders.
    #[default]
    Direct,
    /// Transfer of central-bank reserves routed through the clearing agent.
    ViaClearing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Treat every colimit that fails its universal property as a structural
    /// error, including diagrams with chain intermediaries.
    pub strict_colimits: bool,
    pub settlement_route: SettlementRoute,
    /// Agent that routes `ViaClearing` settlements.
    pub clearing_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_colimits: false,
            settlement_route: SettlementRoute::Direct,
            clearing_agent: CENTRAL_BANK.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> LedgerResult<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.clearing_agent.trim().is_empty() {
            return Err(LedgerError::Config("clearing_agent must not be empty".into()));
        }
        Ok(())
    }

    pub fn with_route(mut self, route: SettlementRoute) -> Self {
        self.settlement_route = route;
        self
    }
}
