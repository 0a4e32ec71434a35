// ABOUTME: Update strategies that plan the next step of a rollout.
// ABOUTME: Rolling moves one replica at a time; user-designed replays one caller policy.

use std::time::Duration;

use super::UpdatePolicy;
use crate::types::{Pod, ReplicaCounts, ready_count};

/// Poll interval for steps planned by the rolling strategy.
pub const ROLLING_CHECK_READY_PERIOD: Duration = Duration::from_secs(2);

/// Readiness budget for steps planned by the rolling strategy.
pub const ROLLING_MAX_TIME_FOR_READY: Duration = Duration::from_secs(300);

/// Step planner for a rollout.
///
/// Chosen once when the updater is built and never swapped. Planning only
/// looks at the pod listings it is given; it never talks to the cluster.
#[derive(Debug, Clone)]
pub enum UpdateStrategy {
    /// One replica per side per step until the desired split is reached.
    Rolling(RollingStrategy),

    /// A single caller-supplied step.
    UserDesigned(UserDesignedStrategy),
}

impl Default for UpdateStrategy {
    fn default() -> Self {
        UpdateStrategy::Rolling(RollingStrategy)
    }
}

impl UpdateStrategy {
    /// Rolling when no policy is given, otherwise replay the given policy once.
    pub fn for_policy(policy: Option<UpdatePolicy>) -> Self {
        match policy {
            Some(policy) => UpdateStrategy::UserDesigned(UserDesignedStrategy::new(policy)),
            None => UpdateStrategy::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UpdateStrategy::Rolling(_) => "rolling",
            UpdateStrategy::UserDesigned(_) => "user-designed",
        }
    }

    /// Plan the next step, or `None` when the rollout has nothing left to do.
    pub fn schedule_update(
        &mut self,
        desired: ReplicaCounts,
        old_pods: &[Pod],
        new_pods: &[Pod],
    ) -> Option<UpdatePolicy> {
        match self {
            UpdateStrategy::Rolling(rolling) => rolling.schedule_update(desired, old_pods, new_pods),
            UpdateStrategy::UserDesigned(user) => user.schedule_update(),
        }
    }
}

/// Moves the live split toward the desired one a single replica at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingStrategy;

impl RollingStrategy {
    pub fn schedule_update(
        &self,
        desired: ReplicaCounts,
        old_pods: &[Pod],
        new_pods: &[Pod],
    ) -> Option<UpdatePolicy> {
        let observed = ReplicaCounts::new(ready_count(old_pods), ready_count(new_pods));
        if observed == desired {
            return None;
        }

        let next = ReplicaCounts::new(
            step_toward(observed.old, desired.old),
            step_toward(observed.new, desired.new),
        );

        // Only shrink first when nothing is being added; otherwise the new
        // replica comes up before an old one goes away.
        let shrinks_old = next.old < observed.old;
        let grows_new = next.new > observed.new;

        Some(UpdatePolicy {
            old_replica_count: next.old,
            new_replica_count: next.new,
            remove_old_first: shrinks_old && !grows_new,
            max_time_for_ready: Some(ROLLING_MAX_TIME_FOR_READY),
            check_ready_period: ROLLING_CHECK_READY_PERIOD,
            ..UpdatePolicy::default()
        })
    }
}

fn step_toward(current: u32, target: u32) -> u32 {
    match current.cmp(&target) {
        std::cmp::Ordering::Less => current + 1,
        std::cmp::Ordering::Greater => current - 1,
        std::cmp::Ordering::Equal => current,
    }
}

/// Hands out a single caller-supplied policy, then reports completion.
#[derive(Debug, Clone)]
pub struct UserDesignedStrategy {
    policy: Option<UpdatePolicy>,
}

impl UserDesignedStrategy {
    pub fn new(policy: UpdatePolicy) -> Self {
        Self {
            policy: Some(policy),
        }
    }

    pub fn schedule_update(&mut self) -> Option<UpdatePolicy> {
        self.policy.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PodName, PodPhase};
    use std::collections::BTreeMap;

    fn ready_pods(n: u32) -> Vec<Pod> {
        (0..n)
            .map(|i| Pod {
                name: PodName::new(format!("pod-{i}")),
                labels: BTreeMap::new(),
                phase: PodPhase::Running,
                ready: true,
            })
            .collect()
    }

    #[test]
    fn no_policy_selects_rolling() {
        let strategy = UpdateStrategy::for_policy(None);
        assert_eq!(strategy.name(), "rolling");
    }

    #[test]
    fn policy_selects_user_designed() {
        let strategy = UpdateStrategy::for_policy(Some(UpdatePolicy::to_counts(0, 3)));
        assert_eq!(strategy.name(), "user-designed");
    }

    #[test]
    fn user_designed_returns_policy_once() {
        let policy = UpdatePolicy::to_counts(0, 3);
        let mut strategy = UpdateStrategy::for_policy(Some(policy.clone()));
        let desired = ReplicaCounts::new(0, 3);

        assert_eq!(
            strategy.schedule_update(desired, &ready_pods(3), &[]),
            Some(policy)
        );
        assert_eq!(strategy.schedule_update(desired, &ready_pods(3), &[]), None);
        assert_eq!(strategy.schedule_update(desired, &[], &ready_pods(3)), None);
    }

    #[test]
    fn rolling_grows_new_before_shrinking_old() {
        let policy = RollingStrategy
            .schedule_update(ReplicaCounts::new(0, 3), &ready_pods(3), &[])
            .unwrap();
        assert_eq!(policy.old_replica_count, 2);
        assert_eq!(policy.new_replica_count, 1);
        assert!(!policy.remove_old_first);
        assert_eq!(policy.max_time_for_ready, Some(ROLLING_MAX_TIME_FOR_READY));
    }

    #[test]
    fn rolling_shrinks_first_when_nothing_grows() {
        let policy = RollingStrategy
            .schedule_update(ReplicaCounts::new(0, 2), &ready_pods(2), &ready_pods(2))
            .unwrap();
        assert_eq!(policy.old_replica_count, 1);
        assert_eq!(policy.new_replica_count, 2);
        assert!(policy.remove_old_first);
    }

    #[test]
    fn rolling_handles_shrinking_new_side() {
        let policy = RollingStrategy
            .schedule_update(ReplicaCounts::new(2, 0), &ready_pods(1), &ready_pods(2))
            .unwrap();
        assert_eq!(policy.old_replica_count, 2);
        assert_eq!(policy.new_replica_count, 1);
    }

    #[test]
    fn rolling_done_when_split_matches() {
        assert_eq!(
            RollingStrategy.schedule_update(ReplicaCounts::new(0, 3), &[], &ready_pods(3)),
            None
        );
    }

    #[test]
    fn rolling_ignores_unready_pods() {
        let mut new_pods = ready_pods(3);
        new_pods[2].ready = false;

        let policy = RollingStrategy
            .schedule_update(ReplicaCounts::new(0, 3), &[], &new_pods)
            .unwrap();
        assert_eq!(policy.new_replica_count, 3);
        assert_eq!(policy.old_replica_count, 0);
    }
}
