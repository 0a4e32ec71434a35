// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup, workload and pod fixtures, and a status recorder.

use parking_lot::Mutex;
use rollstep::types::{LabelSelector, Pod, PodName, PodPhase, ReplicatedWorkload};
use rollstep::update::{StatusListener, UpdatePhase, UpdateStatus};
use std::sync::{Arc, Once};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("rollstep=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// `app=web,version=<version>`
#[allow(dead_code)]
pub fn selector(version: &str) -> LabelSelector {
    LabelSelector::from_pairs([("app", "web"), ("version", version)]).unwrap()
}

#[allow(dead_code)]
pub fn workload(name: &str, version: &str, replicas: u32) -> ReplicatedWorkload {
    ReplicatedWorkload::new(name, selector(version), replicas)
}

/// `n` running, ready pods named `<prefix>-<i>`.
#[allow(dead_code)]
pub fn ready_pods(prefix: &str, n: u32) -> Vec<Pod> {
    (0..n)
        .map(|i| Pod {
            name: PodName::new(format!("{prefix}-{i}")),
            labels: Default::default(),
            phase: PodPhase::Running,
            ready: true,
        })
        .collect()
}

/// Collects every status a listener is handed.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<UpdateStatus>>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn listener(&self) -> StatusListener {
        let seen = Arc::clone(&self.seen);
        Arc::new(move |status: &UpdateStatus| seen.lock().push(status.clone()))
    }

    pub fn statuses(&self) -> Vec<UpdateStatus> {
        self.seen.lock().clone()
    }

    /// Phases in the order seen, with consecutive repeats collapsed.
    pub fn phases(&self) -> Vec<UpdatePhase> {
        let mut phases: Vec<UpdatePhase> = self.seen.lock().iter().map(|s| s.phase).collect();
        phases.dedup();
        phases
    }
}
