// ABOUTME: In-process simulated cluster implementing ClusterClient.
// ABOUTME: Backs the simulate command and tests, with readiness delays and fault injection.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

use super::client::ClusterClient;
use super::error::{ClusterError, ConflictSnafu, DriverSnafu, TransportSnafu};
use crate::types::{LabelSelector, Pod, PodName, PodPhase, ReplicatedWorkload, WorkloadName};

/// A client call as recorded by [`InMemoryCluster::calls`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    GetWorkload(WorkloadName),
    CreateWorkload(WorkloadName),
    ScaleWorkload(WorkloadName, u32),
    DeleteWorkload(WorkloadName),
    ListPods(LabelSelector),
    DeletePod(PodName),
    ClearNotRunningPods(usize),
}

#[derive(Debug, Default)]
struct Faults {
    decline_create: bool,
    decline_delete_workload: bool,
    scale_error: bool,
    list_error: Option<LabelSelector>,
    hidden_pods: Option<LabelSelector>,
}

#[derive(Debug)]
struct StoredWorkload {
    spec: ReplicatedWorkload,
    next_ordinal: u64,
}

#[derive(Debug)]
struct StoredPod {
    pod: Pod,
    owner: WorkloadName,
    ordinal: u64,
    ready_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct State {
    workloads: BTreeMap<WorkloadName, StoredWorkload>,
    pods: BTreeMap<PodName, StoredPod>,
    revision: u64,
    faults: Faults,
    calls: Vec<ClusterCall>,
}

/// Simulated cluster.
///
/// Workloads own pods named `<workload>-<ordinal>` that carry the workload's
/// selector as labels. After every mutation each live workload is reconciled to
/// its replica count: missing pods are created, surplus pods (highest ordinal
/// first) are removed. New pods run immediately and turn ready once
/// `ready_delay` has elapsed; with no delay configured they never turn ready.
///
/// Deleting a workload leaves its pods behind, as a real cluster does until
/// garbage collection catches up.
#[derive(Debug)]
pub struct InMemoryCluster {
    state: Mutex<State>,
    ready_delay: Option<Duration>,
}

impl Default for InMemoryCluster {
    fn default() -> Self {
        Self::new(Some(Duration::ZERO))
    }
}

impl InMemoryCluster {
    /// Create an empty cluster. `None` means new pods never become ready.
    pub fn new(ready_delay: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            ready_delay,
        }
    }

    /// Add a workload whose pods are already running and ready.
    pub fn insert_workload(&self, spec: &ReplicatedWorkload) {
        let mut state = self.state.lock();
        let now = Instant::now();
        state.store_workload(spec);
        state.reconcile(&spec.name, Some(now));
    }

    /// Add a pod that no workload owns, such as one left over from an earlier
    /// rollout. Its phase and readiness stay as given.
    pub fn insert_pod(&self, pod: Pod) {
        let mut state = self.state.lock();
        state.pods.insert(
            pod.name.clone(),
            StoredPod {
                pod,
                owner: WorkloadName::default(),
                ordinal: 0,
                ready_at: None,
            },
        );
    }

    /// Make `create_workload` answer `None`.
    pub fn decline_create(&self) {
        self.state.lock().faults.decline_create = true;
    }

    /// Make `delete_workload` answer `false`.
    pub fn decline_delete_workload(&self) {
        self.state.lock().faults.decline_delete_workload = true;
    }

    /// Make every `scale_workload` call fail with a driver error.
    pub fn fail_scale(&self) {
        self.state.lock().faults.scale_error = true;
    }

    /// Make `list_pods` fail with a transport error for this selector.
    pub fn fail_list_pods(&self, selector: &LabelSelector) {
        self.state.lock().faults.list_error = Some(selector.clone());
    }

    /// Make `list_pods` answer `None` for this selector.
    pub fn hide_pods(&self, selector: &LabelSelector) {
        self.state.lock().faults.hidden_pods = Some(selector.clone());
    }

    /// Mark a pod as failed so it stops counting as running.
    pub fn fail_pod(&self, name: &PodName) -> bool {
        let mut state = self.state.lock();
        match state.pods.get_mut(name) {
            Some(stored) => {
                stored.pod.phase = PodPhase::Failed;
                stored.pod.ready = false;
                stored.ready_at = None;
                true
            }
            None => false,
        }
    }

    /// Current spec of a workload, if it exists.
    pub fn workload(&self, name: &WorkloadName) -> Option<ReplicatedWorkload> {
        self.state.lock().workloads.get(name).map(|w| w.spec.clone())
    }

    /// Pods matching a selector, with readiness evaluated now.
    pub fn pods(&self, selector: &LabelSelector) -> Vec<Pod> {
        let mut state = self.state.lock();
        state.refresh_readiness(Instant::now());
        state.matching(selector)
    }

    /// Every client call made so far, in order.
    pub fn calls(&self) -> Vec<ClusterCall> {
        self.state.lock().calls.clone()
    }

    fn creation_ready_at(&self, now: Instant) -> Option<Instant> {
        self.ready_delay.map(|delay| now + delay)
    }
}

impl State {
    fn record(&mut self, call: ClusterCall) {
        self.calls.push(call);
    }

    fn next_revision(&mut self) -> String {
        self.revision += 1;
        self.revision.to_string()
    }

    fn store_workload(&mut self, spec: &ReplicatedWorkload) -> ReplicatedWorkload {
        let mut stored = spec.clone();
        stored.resource_version = Some(self.next_revision());
        self.workloads.insert(
            spec.name.clone(),
            StoredWorkload {
                spec: stored.clone(),
                next_ordinal: 0,
            },
        );
        stored
    }

    /// Bring the pod population of a workload in line with its replica count.
    fn reconcile(&mut self, name: &WorkloadName, ready_at: Option<Instant>) {
        let Some(workload) = self.workloads.get_mut(name) else {
            return;
        };
        let desired = workload.spec.replicas as usize;

        let mut owned: Vec<(u64, PodName)> = self
            .pods
            .values()
            .filter(|p| &p.owner == name)
            .map(|p| (p.ordinal, p.pod.name.clone()))
            .collect();
        owned.sort();

        while owned.len() > desired {
            if let Some((_, pod_name)) = owned.pop() {
                self.pods.remove(&pod_name);
            }
        }

        while owned.len() < desired {
            let ordinal = workload.next_ordinal;
            workload.next_ordinal += 1;
            let pod_name = PodName::new(format!("{}-{}", name, ordinal));
            let pod = Pod {
                name: pod_name.clone(),
                labels: workload.spec.selector.to_labels(),
                phase: PodPhase::Running,
                ready: false,
            };
            self.pods.insert(
                pod_name.clone(),
                StoredPod {
                    pod,
                    owner: name.clone(),
                    ordinal,
                    ready_at,
                },
            );
            owned.push((ordinal, pod_name));
        }
    }

    fn refresh_readiness(&mut self, now: Instant) {
        for stored in self.pods.values_mut() {
            if stored.pod.phase == PodPhase::Running
                && stored.ready_at.is_some_and(|at| at <= now)
            {
                stored.pod.ready = true;
            }
        }
    }

    fn matching(&self, selector: &LabelSelector) -> Vec<Pod> {
        self.pods
            .values()
            .filter(|p| selector.matches(&p.pod.labels))
            .map(|p| p.pod.clone())
            .collect()
    }
}

#[async_trait]
impl ClusterClient for InMemoryCluster {
    fn driver_name(&self) -> &'static str {
        "InMemory"
    }

    async fn get_workload(
        &self,
        name: &WorkloadName,
    ) -> Result<Option<ReplicatedWorkload>, ClusterError> {
        let mut state = self.state.lock();
        state.record(ClusterCall::GetWorkload(name.clone()));
        Ok(state.workloads.get(name).map(|w| w.spec.clone()))
    }

    async fn create_workload(
        &self,
        spec: &ReplicatedWorkload,
    ) -> Result<Option<ReplicatedWorkload>, ClusterError> {
        let now = Instant::now();
        let ready_at = self.creation_ready_at(now);
        let mut state = self.state.lock();
        state.record(ClusterCall::CreateWorkload(spec.name.clone()));

        if state.faults.decline_create {
            return Ok(None);
        }
        if spec.resource_version.is_some() {
            return ConflictSnafu {
                resource: spec.name.to_string(),
                message: "resource version must not be set on create",
            }
            .fail();
        }
        if state.workloads.contains_key(&spec.name) {
            return ConflictSnafu {
                resource: spec.name.to_string(),
                message: "workload already exists",
            }
            .fail();
        }

        let created = state.store_workload(spec);
        state.reconcile(&spec.name, ready_at);
        Ok(Some(created))
    }

    async fn scale_workload(
        &self,
        name: &WorkloadName,
        replicas: u32,
    ) -> Result<(), ClusterError> {
        let now = Instant::now();
        let ready_at = self.creation_ready_at(now);
        let mut state = self.state.lock();
        state.record(ClusterCall::ScaleWorkload(name.clone(), replicas));

        if state.faults.scale_error {
            return DriverSnafu {
                operation: "scale workload",
                message: format!("scaling {name} is not permitted"),
            }
            .fail();
        }

        let revision = state.next_revision();
        let Some(workload) = state.workloads.get_mut(name) else {
            return DriverSnafu {
                operation: "scale workload",
                message: format!("workload {name} not found"),
            }
            .fail();
        };
        workload.spec.replicas = replicas;
        workload.spec.resource_version = Some(revision);
        state.reconcile(name, ready_at);
        Ok(())
    }

    async fn delete_workload(&self, name: &WorkloadName) -> Result<bool, ClusterError> {
        let mut state = self.state.lock();
        state.record(ClusterCall::DeleteWorkload(name.clone()));

        if state.faults.decline_delete_workload {
            return Ok(false);
        }
        Ok(state.workloads.remove(name).is_some())
    }

    async fn list_pods(&self, selector: &LabelSelector) -> Result<Option<Vec<Pod>>, ClusterError> {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.record(ClusterCall::ListPods(selector.clone()));

        if state.faults.list_error.as_ref() == Some(selector) {
            return TransportSnafu {
                operation: "list pods",
                message: format!("connection reset while listing {selector}"),
            }
            .fail();
        }
        if state.faults.hidden_pods.as_ref() == Some(selector) {
            return Ok(None);
        }

        state.refresh_readiness(now);
        Ok(Some(state.matching(selector)))
    }

    async fn delete_pod(&self, name: &PodName) -> Result<(), ClusterError> {
        let mut state = self.state.lock();
        state.record(ClusterCall::DeletePod(name.clone()));

        match state.pods.remove(name) {
            Some(_) => Ok(()),
            None => DriverSnafu {
                operation: "delete pod",
                message: format!("pod {name} not found"),
            }
            .fail(),
        }
    }

    async fn clear_not_running_pods(&self, pods: &[Pod]) {
        let now = Instant::now();
        let ready_at = self.creation_ready_at(now);
        let mut state = self.state.lock();
        state.record(ClusterCall::ClearNotRunningPods(pods.len()));

        let mut owners = Vec::new();
        for pod in pods.iter().filter(|p| !p.is_running()) {
            if let Some(stored) = state.pods.remove(&pod.name) {
                owners.push(stored.owner);
            }
        }
        for owner in owners {
            state.reconcile(&owner, ready_at);
        }
    }
}
