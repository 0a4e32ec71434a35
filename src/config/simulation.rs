// ABOUTME: Settings for the simulated cluster used by the simulate command.
// ABOUTME: Controls pod readiness delay and extra workloads that exist before any rollout.

use serde::Deserialize;
use std::time::Duration;

use crate::types::ReplicatedWorkload;

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// How long a new pod takes to turn ready. `null` means never.
    #[serde(default = "default_ready_delay", with = "humantime_serde")]
    pub ready_delay: Option<Duration>,

    /// Workloads present in the cluster before the first rollout, e.g. a new
    /// workload that was created ahead of time.
    #[serde(default)]
    pub existing: Vec<ReplicatedWorkload>,
}

fn default_ready_delay() -> Option<Duration> {
    Some(Duration::from_secs(1))
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ready_delay: default_ready_delay(),
            existing: Vec::new(),
        }
    }
}
