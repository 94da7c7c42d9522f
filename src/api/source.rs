//! Seam between the polling controller and the backend.

use async_trait::async_trait;

use crate::models::DashboardSnapshot;

use super::error::ClientError;

#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Fetch one complete dashboard snapshot.
    async fn fetch_snapshot(&self) -> Result<DashboardSnapshot, ClientError>;

    /// Ask the backend to advance the simulation by one cycle.
    /// Returns no data; callers re-fetch to observe the effect.
    async fn trigger_cycle(&self) -> Result<(), ClientError>;
}
