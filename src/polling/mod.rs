//! Polling and display-state synchronization.

mod controller;
mod state;

pub use controller::{CycleOutcome, MountedView, PollingConfig, PollingController};
pub use state::{RefreshOutcome, ViewState};
