//! Projection of a snapshot into render-ready view data.
//!
//! Pure and synchronous. The backend is trusted for ordering and totals:
//! nothing here re-sorts agents or recomputes aggregates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{AgentStatus, DashboardSnapshot, Denomination, PositionView};

/// Header figures, passed through from the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub total_pnl: Decimal,
    pub agent_count: usize,
    pub reference_price: Option<Decimal>,
    pub denomination: Denomination,
    pub fetched_at: DateTime<Utc>,
}

/// One leaderboard line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    /// 1-based position in the received order
    pub rank: usize,
    pub id: i64,
    pub short_name: String,
    pub pnl: Decimal,
}

/// One agent card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentCard {
    pub id: i64,
    pub name: String,
    pub status: AgentStatus,
    pub generation: u32,
    pub pnl: Decimal,
    pub balance: Decimal,
    pub positions: Vec<PositionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub totals: Totals,
    pub ranked_agents: Vec<LeaderboardRow>,
    pub card_agents: Vec<AgentCard>,
}

/// Map a snapshot to view data, keeping at most `leaderboard_limit`
/// leaderboard rows.
pub fn project(snapshot: &DashboardSnapshot, leaderboard_limit: usize) -> DashboardView {
    let totals = Totals {
        total_pnl: snapshot.total_pnl,
        agent_count: snapshot.agent_count,
        reference_price: snapshot.reference_price,
        denomination: snapshot.denomination,
        fetched_at: snapshot.fetched_at,
    };

    let ranked_agents = snapshot
        .agents
        .iter()
        .take(leaderboard_limit)
        .enumerate()
        .map(|(i, agent)| LeaderboardRow {
            rank: i + 1,
            id: agent.id,
            short_name: agent.short_name().to_string(),
            pnl: agent.pnl,
        })
        .collect();

    let card_agents = snapshot
        .agents
        .iter()
        .map(|agent| AgentCard {
            id: agent.id,
            name: agent.name.clone(),
            status: agent.status,
            generation: agent.generation,
            pnl: agent.pnl,
            balance: agent.balance,
            positions: agent.positions.clone(),
        })
        .collect();

    DashboardView {
        totals,
        ranked_agents,
        card_agents,
    }
}
