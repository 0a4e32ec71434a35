// ABOUTME: One planned update step: target replica counts, ordering, delays and bounds.
// ABOUTME: Deserializable from the rollout plan with human-readable durations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which of the two workloads an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Old,
    New,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Old => write!(f, "old"),
            Side::New => write!(f, "new"),
        }
    }
}

/// A single step of a rollout.
///
/// The step scales one workload, waits for it, then scales the other.
/// `remove_old_first` picks which one goes first. Ready-count bounds of zero
/// mean "unbounded" on that side; `max_time_for_ready` of `None` means the
/// readiness wait never times out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePolicy {
    #[serde(default)]
    pub old_replica_count: u32,

    #[serde(default)]
    pub new_replica_count: u32,

    #[serde(default)]
    pub remove_old_first: bool,

    #[serde(default, with = "humantime_serde")]
    pub first_action_delay: Duration,

    #[serde(default, with = "humantime_serde")]
    pub second_action_delay: Duration,

    #[serde(default)]
    pub min_pod_ready_count: u32,

    #[serde(default)]
    pub max_pod_ready_count: u32,

    #[serde(default, with = "humantime_serde")]
    pub max_time_for_ready: Option<Duration>,

    #[serde(default = "default_check_ready_period", with = "humantime_serde")]
    pub check_ready_period: Duration,
}

fn default_check_ready_period() -> Duration {
    Duration::from_secs(2)
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self {
            old_replica_count: 0,
            new_replica_count: 0,
            remove_old_first: false,
            first_action_delay: Duration::ZERO,
            second_action_delay: Duration::ZERO,
            min_pod_ready_count: 0,
            max_pod_ready_count: 0,
            max_time_for_ready: None,
            check_ready_period: default_check_ready_period(),
        }
    }
}

impl UpdatePolicy {
    /// Policy moving old/new to the given counts, everything else default.
    pub fn to_counts(old: u32, new: u32) -> Self {
        Self {
            old_replica_count: old,
            new_replica_count: new,
            ..Self::default()
        }
    }

    /// The two workloads in the order they are acted upon.
    pub fn action_order(&self) -> [Side; 2] {
        if self.remove_old_first {
            [Side::Old, Side::New]
        } else {
            [Side::New, Side::Old]
        }
    }

    /// Replica count this step applies to `side`.
    pub fn replicas_for(&self, side: Side) -> u32 {
        match side {
            Side::Old => self.old_replica_count,
            Side::New => self.new_replica_count,
        }
    }

    /// Ready pod count to wait for after the first or second action.
    pub fn expected_ready(&self, is_first_action: bool) -> u32 {
        if is_first_action ^ self.remove_old_first {
            self.new_replica_count
        } else {
            self.old_replica_count
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grow_first_order_targets_new_then_old() {
        let policy = UpdatePolicy::to_counts(2, 1);
        assert_eq!(policy.action_order(), [Side::New, Side::Old]);
        assert_eq!(policy.expected_ready(true), 1);
        assert_eq!(policy.expected_ready(false), 2);
    }

    #[test]
    fn remove_old_first_targets_old_then_new() {
        let policy = UpdatePolicy {
            remove_old_first: true,
            ..UpdatePolicy::to_counts(2, 1)
        };
        assert_eq!(policy.action_order(), [Side::Old, Side::New]);
        assert_eq!(policy.expected_ready(true), 2);
        assert_eq!(policy.expected_ready(false), 1);
    }

    #[test]
    fn expectation_matches_the_scaled_side() {
        for remove_old_first in [false, true] {
            let policy = UpdatePolicy {
                remove_old_first,
                ..UpdatePolicy::to_counts(4, 7)
            };
            let [first, second] = policy.action_order();
            assert_eq!(policy.expected_ready(true), policy.replicas_for(first));
            assert_eq!(policy.expected_ready(false), policy.replicas_for(second));
        }
    }

    #[test]
    fn parses_human_durations() {
        let yaml = r#"
old_replica_count: 0
new_replica_count: 3
first_action_delay: 500ms
second_action_delay: 1s
max_time_for_ready: 5m
"#;
        let policy: UpdatePolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.new_replica_count, 3);
        assert_eq!(policy.first_action_delay, Duration::from_millis(500));
        assert_eq!(policy.max_time_for_ready, Some(Duration::from_secs(300)));
        assert_eq!(policy.check_ready_period, Duration::from_secs(2));
        assert!(!policy.remove_old_first);
    }

    #[test]
    fn missing_max_time_is_unbounded() {
        let policy: UpdatePolicy = serde_yaml::from_str("new_replica_count: 1").unwrap();
        assert_eq!(policy.max_time_for_ready, None);
    }
}
