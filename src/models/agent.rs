//! Agent model representing one simulated trader as the dashboard shows it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether the backend still runs the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Inactive,
}

impl AgentStatus {
    /// Map the backend's free-form status. Anything but `active` (the backend
    /// uses `terminated`) counts as inactive.
    pub fn from_backend(status: &str) -> Self {
        if status.eq_ignore_ascii_case("active") {
            AgentStatus::Active
        } else {
            AgentStatus::Inactive
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Active => write!(f, "active"),
            AgentStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// Open holding of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionView {
    /// Ticker symbol (e.g., "AAPL")
    pub symbol: String,

    /// Units held
    pub quantity: Decimal,

    /// Average entry price per unit
    pub reference_price: Decimal,

    /// Unrealized P&L in percent as reported by the backend
    pub pnl_percent: Decimal,
}

/// Agent state at the time of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    /// Backend id, unique within a snapshot
    pub id: i64,

    /// Display name (e.g., "Momentum_Gen3_412")
    pub name: String,

    pub status: AgentStatus,

    /// Evolution generation the agent was born in
    pub generation: u32,

    /// P&L in the snapshot's denomination
    pub pnl: Decimal,

    /// Cash balance in the snapshot's denomination
    pub balance: Decimal,

    pub positions: Vec<PositionView>,
}

impl AgentView {
    /// Name without the generation suffix, as the leaderboard shows it.
    pub fn short_name(&self) -> &str {
        self.name.split('_').next().unwrap_or(&self.name)
    }
}
