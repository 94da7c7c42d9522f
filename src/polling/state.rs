//! Display state and the single snapshot slot it lives in.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::models::DashboardSnapshot;

/// What the view can show.
#[derive(Debug, Clone, Default)]
pub enum ViewState {
    /// Nothing requested yet
    #[default]
    Idle,

    /// Waiting for the first successful fetch
    Loading,

    /// A snapshot is available. `refreshing` is set while a newer fetch is in
    /// flight, i.e. the snapshot may be stale.
    Ready {
        snapshot: Arc<DashboardSnapshot>,
        generation: u64,
        refreshing: bool,
    },
}

impl ViewState {
    pub fn snapshot(&self) -> Option<&Arc<DashboardSnapshot>> {
        match self {
            ViewState::Ready { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self, ViewState::Ready { refreshing: true, .. })
    }

    /// Request generation of the displayed snapshot, 0 when there is none.
    pub fn generation(&self) -> u64 {
        match self {
            ViewState::Ready { generation, .. } => *generation,
            _ => 0,
        }
    }
}

/// What happened to a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The snapshot replaced the displayed one
    Applied,
    /// A fetch issued later had already been applied
    Superseded,
    /// The fetch failed; the view kept what it had
    Failed,
    /// The view was torn down before the fetch completed
    Discarded,
}

/// Single-writer, many-reader slot for the view state.
///
/// Every fetch takes a generation from a monotonically increasing counter.
/// A completion is written only if its generation is higher than the one on
/// display, so a slow response can never replace a newer snapshot. All
/// mutations run under the watch channel's lock.
pub(crate) struct SnapshotStore {
    tx: watch::Sender<ViewState>,
    issued: AtomicU64,
    in_flight: AtomicUsize,
    torn_down: AtomicBool,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ViewState::Idle);

        Self {
            tx,
            issued: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            torn_down: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> ViewState {
        self.tx.borrow().clone()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Idle -> Loading.
    pub fn mark_loading(&self) {
        self.tx.send_if_modified(|state| {
            if matches!(state, ViewState::Idle) {
                *state = ViewState::Loading;
                true
            } else {
                false
            }
        });
    }

    /// Register a fetch about to be issued and return its generation.
    pub fn begin(&self) -> u64 {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        self.tx.send_if_modified(|state| {
            self.in_flight.fetch_add(1, Ordering::SeqCst);

            if self.torn_down.load(Ordering::SeqCst) {
                return false;
            }

            match state {
                ViewState::Idle => {
                    *state = ViewState::Loading;
                    true
                }
                ViewState::Ready { refreshing, .. } if !*refreshing => {
                    *refreshing = true;
                    true
                }
                _ => false,
            }
        });

        generation
    }

    /// Record the completion of the fetch with `generation`. `None` means the
    /// fetch failed.
    pub fn complete(&self, generation: u64, snapshot: Option<DashboardSnapshot>) -> RefreshOutcome {
        let mut outcome = RefreshOutcome::Discarded;

        self.tx.send_if_modified(|state| {
            let remaining = self.in_flight.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);

            if self.torn_down.load(Ordering::SeqCst) {
                return false;
            }

            match snapshot {
                Some(snapshot) if generation > state.generation() => {
                    *state = ViewState::Ready {
                        snapshot: Arc::new(snapshot),
                        generation,
                        refreshing: remaining > 0,
                    };
                    outcome = RefreshOutcome::Applied;
                    true
                }
                Some(_) => {
                    outcome = RefreshOutcome::Superseded;
                    settle(state, remaining)
                }
                None => {
                    outcome = RefreshOutcome::Failed;
                    settle(state, remaining)
                }
            }
        });

        outcome
    }

    /// Stop accepting writes. Returns false if already torn down.
    pub fn tear_down(&self) -> bool {
        let mut first = false;

        self.tx.send_if_modified(|_| {
            first = !self.torn_down.swap(true, Ordering::SeqCst);
            false
        });

        first
    }
}

/// Clear the refreshing flag once nothing is in flight.
fn settle(state: &mut ViewState, remaining: usize) -> bool {
    match state {
        ViewState::Ready { refreshing, .. } if *refreshing && remaining == 0 => {
            *refreshing = false;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Denomination;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn snapshot(total: i64) -> DashboardSnapshot {
        DashboardSnapshot::new(Decimal::from(total), Vec::new(), Denomination::Usd, None, Utc::now())
    }

    fn total(store: &SnapshotStore) -> Option<Decimal> {
        store.current().snapshot().map(|s| s.total_pnl)
    }

    #[test]
    fn test_generations_increase() {
        let store = SnapshotStore::new();
        assert_eq!(store.begin(), 1);
        assert_eq!(store.begin(), 2);
        assert_eq!(store.begin(), 3);
    }

    #[test]
    fn test_first_fetch_enters_loading() {
        let store = SnapshotStore::new();
        assert!(matches!(store.current(), ViewState::Idle));

        let generation = store.begin();
        assert!(store.current().is_loading());

        assert_eq!(store.complete(generation, None), RefreshOutcome::Failed);
        assert!(store.current().is_loading());
    }

    #[test]
    fn test_older_completion_is_superseded() {
        let store = SnapshotStore::new();
        let older = store.begin();
        let newer = store.begin();

        assert_eq!(store.complete(newer, Some(snapshot(2))), RefreshOutcome::Applied);
        assert!(store.current().is_refreshing());
        assert_eq!(store.complete(older, Some(snapshot(1))), RefreshOutcome::Superseded);

        assert_eq!(total(&store), Some(Decimal::from(2)));
        assert_eq!(store.current().generation(), newer);
        assert!(!store.current().is_refreshing());
    }

    #[test]
    fn test_refreshing_while_in_flight() {
        let store = SnapshotStore::new();
        let first = store.begin();
        store.complete(first, Some(snapshot(1)));
        assert!(!store.current().is_refreshing());

        let second = store.begin();
        assert!(store.current().is_refreshing());

        assert_eq!(store.complete(second, None), RefreshOutcome::Failed);
        assert!(!store.current().is_refreshing());
        assert_eq!(total(&store), Some(Decimal::from(1)));
    }

    #[test]
    fn test_writes_after_tear_down_are_discarded() {
        let store = SnapshotStore::new();
        let first = store.begin();
        store.complete(first, Some(snapshot(1)));

        let pending = store.begin();
        assert!(store.tear_down());
        assert!(!store.tear_down());

        assert_eq!(store.complete(pending, Some(snapshot(2))), RefreshOutcome::Discarded);
        assert_eq!(total(&store), Some(Decimal::from(1)));
    }

    #[test]
    fn test_readers_are_notified() {
        let store = SnapshotStore::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        let generation = store.begin();
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        store.complete(generation, Some(snapshot(5)));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().generation(), generation);
    }
}
