// ABOUTME: Rollout status tracking with change notification.
// ABOUTME: Phase and counts live behind a mutex; snapshots go to a watch channel and a listener.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use super::Side;

/// Lifecycle phase of a rollout. `Succeed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePhase {
    #[default]
    Unknown,
    Starting,
    Running,
    Succeed,
    Failed,
}

impl UpdatePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UpdatePhase::Succeed | UpdatePhase::Failed)
    }
}

impl fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdatePhase::Unknown => "unknown",
            UpdatePhase::Starting => "starting",
            UpdatePhase::Running => "running",
            UpdatePhase::Succeed => "succeed",
            UpdatePhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of a rollout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateStatus {
    pub phase: UpdatePhase,
    /// Last replica count commanded for the old workload.
    pub old_replica_count: u32,
    /// Last replica count commanded for the new workload.
    pub new_replica_count: u32,
    /// Why the rollout failed. Only set in the `Failed` phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for UpdateStatus {
    fn default() -> Self {
        Self {
            phase: UpdatePhase::Unknown,
            old_replica_count: 0,
            new_replica_count: 0,
            reason: None,
            updated_at: Utc::now(),
        }
    }
}

/// Callback invoked with a fresh snapshot after every status change.
pub type StatusListener = Arc<dyn Fn(&UpdateStatus) + Send + Sync>;

/// Owner of a rollout's status.
///
/// Mutations are atomic with respect to readers and terminal phases absorb
/// any later mutation. The watch channel is updated while the guard is held,
/// the listener is called after it is released, so a listener may read the
/// tracker again.
pub struct StatusTracker {
    state: Mutex<UpdateStatus>,
    sender: watch::Sender<UpdateStatus>,
    listener: Option<StatusListener>,
}

impl fmt::Debug for StatusTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusTracker")
            .field("state", &*self.state.lock())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl StatusTracker {
    pub fn new(listener: Option<StatusListener>) -> Self {
        let initial = UpdateStatus::default();
        let (sender, _) = watch::channel(initial.clone());
        Self {
            state: Mutex::new(initial),
            sender,
            listener,
        }
    }

    /// Independent copy of the current status.
    pub fn snapshot(&self) -> UpdateStatus {
        self.state.lock().clone()
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<UpdateStatus> {
        self.sender.subscribe()
    }

    pub fn starting(&self, old: u32, new: u32) -> bool {
        self.apply(|status| {
            status.phase = UpdatePhase::Starting;
            status.old_replica_count = old;
            status.new_replica_count = new;
        })
    }

    pub fn running(&self) -> bool {
        self.apply(|status| status.phase = UpdatePhase::Running)
    }

    /// Record a replica count just commanded for one side.
    pub fn scaled(&self, side: Side, replicas: u32) -> bool {
        self.apply(|status| match side {
            Side::Old => status.old_replica_count = replicas,
            Side::New => status.new_replica_count = replicas,
        })
    }

    pub fn succeed(&self) -> bool {
        self.apply(|status| status.phase = UpdatePhase::Succeed)
    }

    pub fn fail(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        self.apply(move |status| {
            status.phase = UpdatePhase::Failed;
            status.reason = Some(reason);
        })
    }

    /// Apply a mutation unless the status is already terminal.
    /// Returns whether the mutation happened.
    fn apply(&self, mutate: impl FnOnce(&mut UpdateStatus)) -> bool {
        let snapshot = {
            let mut status = self.state.lock();
            if status.phase.is_terminal() {
                tracing::debug!(phase = %status.phase, "ignoring status change after terminal phase");
                return false;
            }
            mutate(&mut status);
            status.updated_at = Utc::now();
            let snapshot = status.clone();
            self.sender.send_replace(snapshot.clone());
            snapshot
        };

        if let Some(listener) = &self.listener {
            listener(&snapshot);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unknown() {
        let tracker = StatusTracker::new(None);
        assert_eq!(tracker.snapshot().phase, UpdatePhase::Unknown);
    }

    #[test]
    fn terminal_phase_absorbs_changes() {
        let tracker = StatusTracker::new(None);
        tracker.starting(3, 0);
        tracker.running();
        assert!(tracker.fail("boom"));

        assert!(!tracker.succeed());
        assert!(!tracker.scaled(Side::New, 3));
        assert!(!tracker.fail("second"));

        let status = tracker.snapshot();
        assert_eq!(status.phase, UpdatePhase::Failed);
        assert_eq!(status.reason.as_deref(), Some("boom"));
        assert_eq!(status.new_replica_count, 0);
    }

    #[test]
    fn listener_sees_every_change() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: StatusListener = Arc::new(move |s: &UpdateStatus| {
            sink.lock().push((s.phase, s.old_replica_count, s.new_replica_count));
        });
        let tracker = StatusTracker::new(Some(listener));

        tracker.starting(3, 0);
        tracker.running();
        tracker.scaled(Side::New, 1);
        tracker.scaled(Side::Old, 2);
        tracker.succeed();
        tracker.fail("ignored");

        assert_eq!(
            *seen.lock(),
            vec![
                (UpdatePhase::Starting, 3, 0),
                (UpdatePhase::Running, 3, 0),
                (UpdatePhase::Running, 3, 1),
                (UpdatePhase::Running, 2, 1),
                (UpdatePhase::Succeed, 2, 1),
            ]
        );
    }

    #[test]
    fn listener_may_read_tracker() {
        use std::sync::{OnceLock, Weak};
        use std::sync::atomic::{AtomicUsize, Ordering};

        let cell: Arc<OnceLock<Weak<StatusTracker>>> = Arc::new(OnceLock::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let (cell_in, calls_in) = (Arc::clone(&cell), Arc::clone(&calls));
        let reentrant: StatusListener = Arc::new(move |s: &UpdateStatus| {
            if let Some(t) = cell_in.get().and_then(Weak::upgrade) {
                assert_eq!(t.snapshot().phase, s.phase);
                calls_in.fetch_add(1, Ordering::SeqCst);
            }
        });

        let tracker = Arc::new(StatusTracker::new(Some(reentrant)));
        cell.set(Arc::downgrade(&tracker)).ok();

        assert!(tracker.starting(1, 1));
        assert!(tracker.running());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn snapshot_is_detached() {
        let tracker = StatusTracker::new(None);
        tracker.starting(3, 0);
        let before = tracker.snapshot();

        tracker.running();
        tracker.scaled(Side::New, 3);

        assert_eq!(before.phase, UpdatePhase::Starting);
        assert_eq!(before.new_replica_count, 0);
    }

    #[tokio::test]
    async fn subscribers_receive_latest() {
        let tracker = StatusTracker::new(None);
        let mut rx = tracker.subscribe();

        tracker.starting(2, 0);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().phase, UpdatePhase::Starting);

        tracker.running();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().phase, UpdatePhase::Running);
    }
}
