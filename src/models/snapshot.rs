//! Dashboard snapshot: one complete capture of the arena at a point in time.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::agent::AgentView;

/// Version of the canonical snapshot schema produced by the client adapter.
pub const SCHEMA_VERSION: u32 = 1;

/// Unit the backend reports money in. Deployments serve one of two payload
/// variants; the monitor is configured for one and adapts it to the
/// canonical snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Denomination {
    /// US dollars (`total_pnl_usd`, `pnl_usd`, or the unsuffixed fields)
    #[default]
    Usd,
    /// Units of the S&P 500 index (`total_pnl_spx`, `pnl_spx`)
    Spx,
}

impl std::fmt::Display for Denomination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Denomination::Usd => write!(f, "USD"),
            Denomination::Spx => write!(f, "SPX"),
        }
    }
}

/// Immutable dashboard state. Replaced wholesale on every applied poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub schema_version: u32,

    /// Aggregate P&L as reported by the backend (never recomputed)
    pub total_pnl: Decimal,

    /// Number of agents received
    pub agent_count: usize,

    /// Agents in the order the backend delivered them
    pub agents: Vec<AgentView>,

    pub denomination: Denomination,

    /// SPX index price the backend converted with, when reported
    #[serde(default)]
    pub reference_price: Option<Decimal>,

    /// When the monitor received this snapshot
    pub fetched_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn new(
        total_pnl: Decimal,
        agents: Vec<AgentView>,
        denomination: Denomination,
        reference_price: Option<Decimal>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            total_pnl,
            agent_count: agents.len(),
            agents,
            denomination,
            reference_price,
            fetched_at,
        }
    }
}
