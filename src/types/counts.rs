// ABOUTME: Old/new replica count pairs.
// ABOUTME: Used both for the fixed desired target and for live ready observations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A pair of replica counts, one for the old workload and one for the new.
///
/// As the desired target it is captured once when a rollout starts and never
/// changes. As an observation it is rebuilt from fresh pod listings each time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplicaCounts {
    pub old: u32,
    pub new: u32,
}

impl ReplicaCounts {
    pub const fn new(old: u32, new: u32) -> Self {
        Self { old, new }
    }

    pub const fn total(&self) -> u32 {
        self.old.saturating_add(self.new)
    }
}

impl fmt::Display for ReplicaCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "old={}, new={}", self.old, self.new)
    }
}
