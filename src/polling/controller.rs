//! Polling controller: keeps the displayed snapshot in sync with the backend.
//!
//! Handles:
//! - The on-mount fetch and the recurring background refresh
//! - Loading and staleness state for the view
//! - Ordering of overlapping fetches (newest issued wins)
//! - The manual "run cycle" action

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::api::StatsSource;

use super::state::{RefreshOutcome, SnapshotStore, ViewState};

/// Polling configuration.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Time between background refreshes
    pub poll_interval: Duration,

    /// Whether `run_cycle` still refreshes when the trigger call fails
    pub refresh_after_failed_cycle: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            refresh_after_failed_cycle: false,
        }
    }
}

/// Result of a manual cycle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// The backend accepted the cycle trigger
    pub triggered: bool,

    /// Outcome of the follow-up refresh, if one ran
    pub refresh: Option<RefreshOutcome>,
}

impl CycleOutcome {
    /// The follow-up fetch put a new snapshot on display.
    pub fn refreshed(&self) -> bool {
        self.refresh == Some(RefreshOutcome::Applied)
    }
}

/// Drives a `StatsSource` and owns the view's snapshot slot.
///
/// A controller backs one view lifetime: mount it once, and build a new
/// controller for a new view.
pub struct PollingController {
    source: Arc<dyn StatsSource>,
    store: SnapshotStore,
    config: PollingConfig,
}

impl PollingController {
    pub fn new(source: Arc<dyn StatsSource>, config: PollingConfig) -> Arc<Self> {
        Arc::new(Self {
            source,
            store: SnapshotStore::new(),
            config,
        })
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.store.subscribe()
    }

    pub fn state(&self) -> ViewState {
        self.store.current()
    }

    /// Enter Loading and start the background refresh. The first tick fires
    /// immediately. Polling stops when the returned guard is unmounted or
    /// dropped.
    pub fn mount(self: &Arc<Self>) -> MountedView {
        if self.store.is_torn_down() {
            warn!("Controller already torn down, not starting timer");
            return MountedView {
                controller: Arc::clone(self),
                timer: None,
            };
        }

        self.store.mark_loading();

        let controller = Arc::clone(self);
        let period = self.config.poll_interval;

        // Each tick spawns its fetch so a slow response never delays the
        // next tick. The fetches live in the timer's JoinSet and are aborted
        // with it.
        let timer = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut fetches: JoinSet<RefreshOutcome> = JoinSet::new();

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let controller = Arc::clone(&controller);
                        fetches.spawn(async move { controller.refresh().await });
                    }
                    Some(done) = fetches.join_next(), if !fetches.is_empty() => {
                        if let Err(e) = done {
                            error!(error = %e, "Background fetch task failed");
                        }
                    }
                }
            }
        });

        info!(interval_secs = period.as_secs(), "Polling started");

        MountedView {
            controller: Arc::clone(self),
            timer: Some(timer),
        }
    }

    /// Fetch one snapshot and apply it if nothing newer has been applied.
    /// Failures are logged and leave the view as it was.
    pub async fn refresh(&self) -> RefreshOutcome {
        let generation = self.store.begin();

        match self.source.fetch_snapshot().await {
            Ok(snapshot) => {
                let agents = snapshot.agent_count;
                let outcome = self.store.complete(generation, Some(snapshot));

                match outcome {
                    RefreshOutcome::Applied => {
                        debug!(generation = generation, agents = agents, "Snapshot applied");
                    }
                    RefreshOutcome::Superseded => {
                        debug!(generation = generation, "Dropping superseded snapshot");
                    }
                    _ => {
                        debug!(generation = generation, "View torn down, dropping snapshot");
                    }
                }

                outcome
            }
            Err(e) => {
                warn!(
                    generation = generation,
                    kind = %e.kind(),
                    error = %e,
                    "Failed to fetch dashboard stats"
                );
                self.store.complete(generation, None)
            }
        }
    }

    /// Ask the backend to run one simulation cycle, then refresh.
    ///
    /// A failed trigger skips the refresh unless `refresh_after_failed_cycle`
    /// is set.
    pub async fn run_cycle(&self) -> CycleOutcome {
        match self.source.trigger_cycle().await {
            Ok(()) => {
                info!("Simulation cycle triggered");
                CycleOutcome {
                    triggered: true,
                    refresh: Some(self.refresh().await),
                }
            }
            Err(e) => {
                error!(kind = %e.kind(), error = %e, "Failed to trigger simulation cycle");

                let refresh = if self.config.refresh_after_failed_cycle {
                    Some(self.refresh().await)
                } else {
                    None
                };

                CycleOutcome {
                    triggered: false,
                    refresh,
                }
            }
        }
    }
}

/// Scope of a mounted view. Owns the recurring timer; tearing down cancels
/// it exactly once and stops any later completion from touching the view.
pub struct MountedView {
    controller: Arc<PollingController>,
    timer: Option<JoinHandle<()>>,
}

impl MountedView {
    pub fn controller(&self) -> &Arc<PollingController> {
        &self.controller
    }

    /// Tear the view down and wait for the timer task, and with it every
    /// timer fetch still in flight, to finish.
    pub async fn unmount(mut self) {
        if let Some(timer) = self.teardown() {
            // Aborted on purpose; the join error carries nothing.
            let _ = timer.await;
        }
    }

    fn teardown(&mut self) -> Option<JoinHandle<()>> {
        let timer = self.timer.take()?;

        self.controller.store.tear_down();
        timer.abort();

        info!("Polling stopped");
        Some(timer)
    }
}

impl Drop for MountedView {
    fn drop(&mut self) {
        self.teardown();
    }
}
