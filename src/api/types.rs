//! Wire types for the arena backend and the adapter to the canonical snapshot.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{AgentStatus, AgentView, DashboardSnapshot, Denomination, PositionView};

use super::error::ClientError;

/// Response from /dashboard/stats. Both payload variants seen in deployment
/// are accepted here; `into_snapshot` picks the fields for one denomination.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub total_pnl: Option<Decimal>,
    #[serde(default)]
    pub total_pnl_usd: Option<Decimal>,
    #[serde(default)]
    pub total_pnl_spx: Option<Decimal>,
    #[serde(default)]
    pub spx_price: Option<Decimal>,
    pub agents: Vec<AgentStatsResponse>,
}

/// Agent entry in the stats response.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentStatsResponse {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub generation: Option<u32>,
    #[serde(default)]
    pub pnl: Option<Decimal>,
    #[serde(default)]
    pub pnl_usd: Option<Decimal>,
    #[serde(default)]
    pub pnl_spx: Option<Decimal>,
    #[serde(default)]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub balance_usd: Option<Decimal>,
    #[serde(default)]
    pub balance_spx: Option<Decimal>,
    #[serde(default)]
    pub positions: Vec<PositionStatsResponse>,
}

fn default_status() -> String {
    "active".to_string()
}

/// Position entry of an agent.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionStatsResponse {
    pub symbol: String,
    pub qty: Decimal,
    #[serde(default, alias = "avg_price")]
    pub entry: Option<Decimal>,
    #[serde(default)]
    pub pnl_pct: Option<Decimal>,
}

/// Response from the backend's health route.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl StatsResponse {
    /// Adapt the raw payload to the canonical snapshot. Either every agent is
    /// converted or the whole payload is rejected.
    pub fn into_snapshot(
        self,
        denomination: Denomination,
        fetched_at: DateTime<Utc>,
    ) -> Result<DashboardSnapshot, ClientError> {
        let total_pnl = match denomination {
            Denomination::Usd => self
                .total_pnl_usd
                .or(self.total_pnl)
                .ok_or_else(|| ClientError::missing("total_pnl_usd"))?,
            Denomination::Spx => self
                .total_pnl_spx
                .ok_or_else(|| ClientError::missing("total_pnl_spx"))?,
        };

        let mut seen = HashSet::with_capacity(self.agents.len());
        let agents = self
            .agents
            .into_iter()
            .map(|agent| {
                if !seen.insert(agent.id) {
                    return Err(ClientError::Decode(format!("duplicate agent id {}", agent.id)));
                }
                agent.into_view(denomination)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DashboardSnapshot::new(
            total_pnl,
            agents,
            denomination,
            self.spx_price,
            fetched_at,
        ))
    }
}

impl AgentStatsResponse {
    fn into_view(self, denomination: Denomination) -> Result<AgentView, ClientError> {
        let (pnl, balance) = match denomination {
            Denomination::Usd => (
                self.pnl_usd.or(self.pnl).ok_or_else(|| ClientError::missing("pnl_usd"))?,
                self.balance_usd
                    .or(self.balance)
                    .ok_or_else(|| ClientError::missing("balance_usd"))?,
            ),
            Denomination::Spx => (
                self.pnl_spx.ok_or_else(|| ClientError::missing("pnl_spx"))?,
                self.balance_spx.ok_or_else(|| ClientError::missing("balance_spx"))?,
            ),
        };

        let positions = self
            .positions
            .into_iter()
            .map(|p| PositionView {
                symbol: p.symbol,
                quantity: p.qty,
                reference_price: p.entry.unwrap_or(Decimal::ZERO),
                pnl_percent: p.pnl_pct.unwrap_or(Decimal::ZERO),
            })
            .collect();

        Ok(AgentView {
            id: self.id,
            status: AgentStatus::from_backend(&self.status),
            name: self.name,
            generation: self.generation.unwrap_or(1),
            pnl,
            balance,
            positions,
        })
    }
}
