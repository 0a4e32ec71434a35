// ABOUTME: Readiness waiting: poll a workload's pods until they match an expected count.
// ABOUTME: Bounded by the policy's readiness budget and interruptible via cancellation.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::UpdatePolicy;
use super::error::{InterruptPoint, UpdateError};
use crate::cluster::ClusterClient;
use crate::types::{ReplicatedWorkload, ready_count};

/// Shortest sleep between listings, applied when a policy asks for no pause at all.
pub const MIN_CHECK_PERIOD: Duration = Duration::from_millis(10);

/// Sleep for `duration` unless cancelled first. Returns `false` on cancellation.
pub(crate) async fn pause(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Polls pod listings until a workload settles at an expected size.
pub struct ReadinessWaiter<'a, C: ClusterClient + ?Sized> {
    client: &'a C,
    cancel: &'a CancellationToken,
}

impl<'a, C: ClusterClient + ?Sized> ReadinessWaiter<'a, C> {
    pub fn new(client: &'a C, cancel: &'a CancellationToken) -> Self {
        Self { client, cancel }
    }

    /// Wait until `workload` has exactly `expected` pods, all of them ready.
    ///
    /// Each round lists the workload's pods; on a mismatch, pods that are not
    /// running are cleared and the waiter sleeps for `check_ready_period`
    /// (at least [`MIN_CHECK_PERIOD`]), shortened so the total never exceeds
    /// `max_time_for_ready`. Once that budget is used up the wait fails with a
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns `ReadinessTimeout` when the budget runs out, `PodsDisappeared`
    /// when the listing is unavailable while pods are expected, `Interrupted`
    /// when cancelled during a sleep, and `Driver` for client failures.
    pub async fn wait_for_ready(
        &self,
        workload: &ReplicatedWorkload,
        expected: u32,
        policy: &UpdatePolicy,
    ) -> Result<(), UpdateError> {
        let start = Instant::now();
        let mut polls: u64 = 0;

        loop {
            polls = polls.saturating_add(1);
            let listing = self
                .client
                .list_pods(&workload.selector)
                .await
                .map_err(|e| UpdateError::driver(self.client.driver_name(), e))?;

            let pods = match listing {
                Some(pods) => pods,
                None if expected == 0 => return Ok(()),
                None => return Err(UpdateError::PodsDisappeared(workload.name.clone())),
            };

            let ready = ready_count(&pods);
            let total = pods.len() as u32;
            if ready == expected && total == expected {
                debug!(workload = %workload.name, expected, polls, "workload ready");
                return Ok(());
            }

            self.client.clear_not_running_pods(&pods).await;

            let period = policy.check_ready_period.max(MIN_CHECK_PERIOD);
            let wait = match policy.max_time_for_ready {
                None => period,
                Some(budget) => match budget.checked_sub(start.elapsed()) {
                    Some(left) if !left.is_zero() => left.min(period),
                    _ => {
                        return Err(UpdateError::ReadinessTimeout {
                            workload: workload.name.clone(),
                            waited: start.elapsed(),
                        });
                    }
                },
            };

            debug!(
                workload = %workload.name,
                expected,
                ready,
                total,
                wait_ms = wait.as_millis() as u64,
                "waiting for pods"
            );

            if !pause(self.cancel, wait).await {
                return Err(UpdateError::Interrupted(InterruptPoint::WaitingForReady));
            }
        }
    }
}
