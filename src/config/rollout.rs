// ABOUTME: One planned rollout in the config file: an old workload, a new one and an optional step policy.
// ABOUTME: Also checks a plan for the problems that would make the updater skip or misbehave.

use serde::Deserialize;

use crate::types::ReplicatedWorkload;
use crate::update::UpdatePolicy;

/// A rollout from `old` to `new`.
///
/// `old.replicas` is what currently runs; `retain_old` is how many old
/// replicas should remain afterwards. With the default of zero the old
/// workload is deleted once the rollout completes.
#[derive(Debug, Clone, Deserialize)]
pub struct RolloutPlan {
    pub old: ReplicatedWorkload,

    pub new: ReplicatedWorkload,

    #[serde(default)]
    pub retain_old: u32,

    /// Replay this single step instead of rolling one replica at a time.
    #[serde(default)]
    pub policy: Option<UpdatePolicy>,
}

impl RolloutPlan {
    /// Human-readable identifier, e.g. `web-v1 -> web-v2`.
    pub fn label(&self) -> String {
        format!("{} -> {}", self.old.name, self.new.name)
    }

    /// The old workload as the updater expects it: replicas set to the count
    /// that should remain.
    pub fn old_target(&self) -> ReplicatedWorkload {
        self.old.with_replicas(self.retain_old)
    }

    pub(super) fn problems(&self, at: &str) -> Vec<String> {
        let mut problems = Vec::new();

        for (side, workload) in [("old", &self.old), ("new", &self.new)] {
            if workload.name.is_empty() {
                problems.push(format!("{at}.{side}: workload has no name"));
            }
            if workload.selector.is_empty() {
                problems.push(format!("{at}.{side}: workload has no selector"));
            }
        }

        if !self.old.name.is_empty() && self.old.name == self.new.name {
            problems.push(format!(
                "{at}: old and new workloads share the name '{}'",
                self.old.name
            ));
        }

        if self.old.selector.overlaps(&self.new.selector) {
            problems.push(format!(
                "{at}: selectors '{}' and '{}' overlap",
                self.old.selector, self.new.selector
            ));
        }

        if self.retain_old > self.old.replicas {
            problems.push(format!(
                "{at}: retain_old {} exceeds the {} replicas of '{}'",
                self.retain_old, self.old.replicas, self.old.name
            ));
        }

        if let Some(policy) = &self.policy {
            if policy.check_ready_period.is_zero() {
                problems.push(format!("{at}.policy: check_ready_period must be positive"));
            }
            if policy.max_pod_ready_count > 0
                && policy.min_pod_ready_count > policy.max_pod_ready_count
            {
                problems.push(format!(
                    "{at}.policy: min_pod_ready_count {} exceeds max_pod_ready_count {}",
                    policy.min_pod_ready_count, policy.max_pod_ready_count
                ));
            }
        }

        problems
    }
}
