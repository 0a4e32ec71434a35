// ABOUTME: Rolling updater that drives an old workload to a new one step by step.
// ABOUTME: Runs as a spawned task, checks bounds around each action and retires the old workload.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::bounds::check_ready_bounds;
use super::error::{InterruptPoint, UpdateError};
use super::status::{StatusListener, StatusTracker, UpdateStatus};
use super::strategy::UpdateStrategy;
use super::waiter::{ReadinessWaiter, pause};
use super::{Side, UpdatePolicy};
use crate::cluster::{ClusterClient, ClusterError};
use crate::types::{Pod, ReplicaCounts, ReplicatedWorkload, ready_count};

/// Reason recorded when the update task ends without reaching a terminal phase.
pub const UNKNOWN_TERMINATION: &str = "unknown reason for update thread terminated";

/// How long `stop` waits for the task to notice cancellation before aborting it.
pub const STOP_GRACE: Duration = Duration::from_millis(100);

/// How an `update` run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// All steps applied and the old workload retired if requested.
    Completed,
    /// A workload lacked a name or selector; nothing was done.
    Skipped,
}

enum Task {
    Idle,
    Running(JoinHandle<()>),
    Finished,
}

struct Inner<C: ClusterClient + ?Sized> {
    client: Arc<C>,
    old: ReplicatedWorkload,
    new: ReplicatedWorkload,
    strategy: Mutex<UpdateStrategy>,
    status: StatusTracker,
    cancel: CancellationToken,
}

/// Drives the cluster from an old replicated workload to a new one.
///
/// The replica counts of the `old` and `new` specs given at construction are
/// the desired final counts: the old count is usually zero, in which case the
/// old workload and its leftover pods are deleted once every step is done.
///
/// One updater runs one rollout. A second `start` is rejected while the first
/// task runs, and after it has finished.
pub struct RollingUpdater<C: ClusterClient + ?Sized + 'static> {
    inner: Arc<Inner<C>>,
    task: Mutex<Task>,
}

impl<C: ClusterClient + ?Sized + 'static> fmt::Debug for RollingUpdater<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollingUpdater")
            .field("old", &self.inner.old.name)
            .field("new", &self.inner.new.name)
            .field("strategy", &self.inner.strategy.lock().name())
            .field("status", &self.inner.status.snapshot().phase)
            .finish()
    }
}

impl<C: ClusterClient + ?Sized + 'static> RollingUpdater<C> {
    /// Create an updater. `None` policy selects the rolling strategy.
    pub fn new(
        client: Arc<C>,
        old: ReplicatedWorkload,
        new: ReplicatedWorkload,
        policy: Option<UpdatePolicy>,
    ) -> Self {
        Self::with_listener(client, old, new, policy, None)
    }

    /// Create an updater whose status changes are also pushed to `listener`.
    pub fn with_listener(
        client: Arc<C>,
        mut old: ReplicatedWorkload,
        mut new: ReplicatedWorkload,
        policy: Option<UpdatePolicy>,
        listener: Option<StatusListener>,
    ) -> Self {
        old.clear_resource_version();
        new.clear_resource_version();

        let status = StatusTracker::new(listener);
        status.starting(old.replicas, new.replicas);

        Self {
            inner: Arc::new(Inner {
                client,
                old,
                new,
                strategy: Mutex::new(UpdateStrategy::for_policy(policy)),
                status,
                cancel: CancellationToken::new(),
            }),
            task: Mutex::new(Task::Idle),
        }
    }

    /// Spawn the update onto `handle` and return immediately.
    ///
    /// # Errors
    ///
    /// `AlreadyRunning` if a task from an earlier `start` is still active,
    /// `AlreadyFinished` if it has ended.
    pub fn start(&self, handle: &Handle) -> Result<(), UpdateError> {
        let mut task = self.task.lock();
        match &*task {
            Task::Idle => {}
            Task::Running(join) if !join.is_finished() => return Err(UpdateError::AlreadyRunning),
            Task::Running(_) | Task::Finished => return Err(UpdateError::AlreadyFinished),
        }

        let inner = Arc::clone(&self.inner);
        let join = handle.spawn(async move {
            // The outcome is already reflected in the status.
            let _ = inner.run().await;
        });
        *task = Task::Running(join);
        Ok(())
    }

    /// Independent snapshot of the rollout status.
    ///
    /// If the task has ended without reaching `Succeed` or `Failed` (it was
    /// aborted, panicked or skipped invalid input), the status is marked
    /// failed first.
    pub fn status(&self) -> UpdateStatus {
        if self.task_finished() && !self.inner.status.snapshot().phase.is_terminal() {
            warn!(
                old = %self.inner.old.name,
                new = %self.inner.new.name,
                "update task ended without a terminal phase"
            );
            self.inner.status.fail(UNKNOWN_TERMINATION);
        }
        self.inner.status.snapshot()
    }

    /// Check that both workloads have a name and a selector.
    ///
    /// A rollout that fails this check is skipped by `update` without any
    /// status change; callers that want an error instead can check first.
    pub fn validate(&self) -> Result<(), UpdateError> {
        self.inner.validate()
    }

    /// Receiver for every status change from now on.
    pub fn subscribe(&self) -> watch::Receiver<UpdateStatus> {
        self.inner.status.subscribe()
    }

    /// Cancel the running task.
    ///
    /// Cancellation is cooperative first: the task fails at its next sleep.
    /// If it has not ended within [`STOP_GRACE`] it is aborted. Cluster
    /// changes already made are left as they are. No-op if the task was never
    /// started or has already ended.
    pub async fn stop(&self) {
        let mut join = {
            let mut task = self.task.lock();
            match std::mem::replace(&mut *task, Task::Finished) {
                Task::Running(join) if !join.is_finished() => join,
                other => {
                    *task = other;
                    return;
                }
            }
        };

        debug!(old = %self.inner.old.name, new = %self.inner.new.name, "stopping update");
        self.inner.cancel.cancel();
        if tokio::time::timeout(STOP_GRACE, &mut join).await.is_err() {
            warn!(
                old = %self.inner.old.name,
                new = %self.inner.new.name,
                "update did not stop cooperatively, aborting"
            );
            join.abort();
        }
    }

    /// Same as [`stop`](Self::stop).
    pub async fn close(&self) {
        self.stop().await;
    }

    /// Resuming a failed or cancelled rollout is not supported; this does nothing.
    pub fn continue_update(&self) {
        debug!(old = %self.inner.old.name, "continue_update is not supported");
    }

    /// Run the update on the current task and wait for it.
    ///
    /// Any error has already been recorded as a `Failed` status when this
    /// returns.
    pub async fn update(&self) -> Result<UpdateOutcome, UpdateError> {
        self.inner.run().await
    }

    fn task_finished(&self) -> bool {
        match &*self.task.lock() {
            Task::Idle => false,
            Task::Running(join) => join.is_finished(),
            Task::Finished => true,
        }
    }
}

impl<C: ClusterClient + ?Sized + 'static> Drop for RollingUpdater<C> {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

impl<C: ClusterClient + ?Sized> Inner<C> {
    async fn run(&self) -> Result<UpdateOutcome, UpdateError> {
        match self.execute().await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                error!(
                    old = %self.old.name,
                    new = %self.new.name,
                    reason = %err,
                    "update failed"
                );
                self.status.fail(err.to_string());
                Err(err)
            }
        }
    }

    fn validate(&self) -> Result<(), UpdateError> {
        if !self.old.is_addressable() {
            return Err(UpdateError::Validation(Side::Old));
        }
        if !self.new.is_addressable() {
            return Err(UpdateError::Validation(Side::New));
        }
        Ok(())
    }

    async fn execute(&self) -> Result<UpdateOutcome, UpdateError> {
        if let Err(err) = self.validate() {
            warn!(
                old = %self.old.name,
                new = %self.new.name,
                reason = %err,
                "skipping update"
            );
            return Ok(UpdateOutcome::Skipped);
        }

        let desired = ReplicaCounts::new(self.old.replicas, self.new.replicas);
        self.status.running();
        info!(
            old = %self.old.name,
            new = %self.new.name,
            strategy = self.strategy.lock().name(),
            %desired,
            "update started"
        );

        self.ensure_workloads().await?;

        loop {
            let old_pods = self.pods_of(&self.old).await?;
            let new_pods = self.pods_of(&self.new).await?;
            let Some(policy) = self
                .strategy
                .lock()
                .schedule_update(desired, &old_pods, &new_pods)
            else {
                break;
            };
            debug!(?policy, "update one step further");
            self.update_one_step(&policy).await?;
        }

        if desired.old == 0 {
            self.retire_old().await?;
        }

        self.status.succeed();
        info!(old = %self.old.name, new = %self.new.name, "update succeeded");
        Ok(UpdateOutcome::Completed)
    }

    fn driver_error(&self) -> impl Fn(ClusterError) -> UpdateError + '_ {
        move |e| UpdateError::driver(self.client.driver_name(), e)
    }

    /// The old workload must exist; the new one is created at zero replicas if missing.
    async fn ensure_workloads(&self) -> Result<(), UpdateError> {
        let existing_old = self
            .client
            .get_workload(&self.old.name)
            .await
            .map_err(self.driver_error())?;
        if existing_old.is_none() {
            return Err(UpdateError::OldWorkloadMissing(self.old.name.clone()));
        }

        let new_spec = self.new.with_replicas(0);
        let existing_new = self
            .client
            .get_workload(&new_spec.name)
            .await
            .map_err(self.driver_error())?;
        if existing_new.is_none() {
            let created = self
                .client
                .create_workload(&new_spec)
                .await
                .map_err(self.driver_error())?;
            if created.is_none() {
                return Err(UpdateError::CreateFailed(new_spec.name));
            }
            info!(workload = %new_spec.name, "created new workload");
        }
        Ok(())
    }

    async fn update_one_step(&self, policy: &UpdatePolicy) -> Result<(), UpdateError> {
        self.check_bounds(policy).await?;

        if !policy.first_action_delay.is_zero() {
            if !pause(&self.cancel, policy.first_action_delay).await {
                return Err(UpdateError::Interrupted(InterruptPoint::BeforeFirstAction));
            }
            self.check_bounds(policy).await?;
        }

        let [first, second] = policy.action_order();
        let waiter = ReadinessWaiter::new(self.client.as_ref(), &self.cancel);

        self.scale(first, policy).await?;
        waiter
            .wait_for_ready(self.workload(first), policy.expected_ready(true), policy)
            .await?;

        if !policy.second_action_delay.is_zero()
            && !pause(&self.cancel, policy.second_action_delay).await
        {
            return Err(UpdateError::Interrupted(InterruptPoint::BeforeSecondAction));
        }
        self.check_bounds(policy).await?;

        self.scale(second, policy).await?;
        waiter
            .wait_for_ready(self.workload(second), policy.expected_ready(false), policy)
            .await?;

        self.check_bounds(policy).await
    }

    fn workload(&self, side: Side) -> &ReplicatedWorkload {
        match side {
            Side::Old => &self.old,
            Side::New => &self.new,
        }
    }

    async fn scale(&self, side: Side, policy: &UpdatePolicy) -> Result<(), UpdateError> {
        let workload = self.workload(side);
        let replicas = policy.replicas_for(side);
        self.client
            .scale_workload(&workload.name, replicas)
            .await
            .map_err(self.driver_error())?;
        debug!(workload = %workload.name, %side, replicas, "scaled workload");
        self.status.scaled(side, replicas);
        Ok(())
    }

    async fn pods_of(&self, workload: &ReplicatedWorkload) -> Result<Vec<Pod>, UpdateError> {
        let pods = self
            .client
            .list_pods(&workload.selector)
            .await
            .map_err(self.driver_error())?;
        Ok(pods.unwrap_or_default())
    }

    async fn ready_counts(&self) -> Result<ReplicaCounts, UpdateError> {
        let old = ready_count(&self.pods_of(&self.old).await?);
        let new = ready_count(&self.pods_of(&self.new).await?);
        Ok(ReplicaCounts::new(old, new))
    }

    async fn check_bounds(&self, policy: &UpdatePolicy) -> Result<(), UpdateError> {
        let ready = self.ready_counts().await?;
        check_ready_bounds(policy, ready)
    }

    /// Delete the old workload and whatever pods it left behind.
    async fn retire_old(&self) -> Result<(), UpdateError> {
        let ready_old = ready_count(&self.pods_of(&self.old).await?);
        if ready_old != 0 {
            return Err(UpdateError::OldPodsRemain(ready_old));
        }

        let deleted = self
            .client
            .delete_workload(&self.old.name)
            .await
            .map_err(self.driver_error())?;
        if !deleted {
            return Err(UpdateError::DeleteFailed(self.old.name.clone()));
        }
        info!(workload = %self.old.name, "deleted old workload");

        for pod in self.pods_of(&self.old).await? {
            if let Err(e) = self.client.delete_pod(&pod.name).await {
                warn!(pod = %pod.name, error = %e, "failed to delete leftover pod");
            }
        }
        Ok(())
    }
}
