//! Data models for dashboard snapshots, agents, and positions.

mod agent;
mod snapshot;

pub use agent::{AgentStatus, AgentView, PositionView};
pub use snapshot::{DashboardSnapshot, Denomination, SCHEMA_VERSION};
