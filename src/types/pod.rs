// ABOUTME: Minimal projection of a cluster pod: name, labels, phase and readiness.
// ABOUTME: Pods are observed and deleted by the updater, never built by it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::name::PodName;

/// Lifecycle phase reported by the cluster for a pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PodPhase {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    pub name: PodName,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub phase: PodPhase,
    #[serde(default)]
    pub ready: bool,
}

impl Pod {
    pub fn is_running(&self) -> bool {
        self.phase == PodPhase::Running
    }

    /// Running and passing its readiness probe.
    pub fn is_ready(&self) -> bool {
        self.is_running() && self.ready
    }
}

/// Number of ready pods in a listing.
pub fn ready_count(pods: &[Pod]) -> u32 {
    pods.iter().filter(|p| p.is_ready()).count() as u32
}
