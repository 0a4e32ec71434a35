// ABOUTME: Replicated workload spec: a name, a pod selector and a replica count.
// ABOUTME: Carries the server-side revision that must be cleared before writes.

use serde::{Deserialize, Serialize};

use super::name::WorkloadName;
use super::selector::LabelSelector;

/// A named resource whose pods are enumerated by a label selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicatedWorkload {
    #[serde(default)]
    pub name: WorkloadName,

    #[serde(default)]
    pub selector: LabelSelector,

    #[serde(default)]
    pub replicas: u32,

    /// Server-side revision. Stale revisions conflict on create, so it is
    /// cleared before the spec is handed back to the cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

impl ReplicatedWorkload {
    pub fn new(name: impl Into<String>, selector: LabelSelector, replicas: u32) -> Self {
        Self {
            name: WorkloadName::new(name),
            selector,
            replicas,
            resource_version: None,
        }
    }

    /// Name and selector are both present.
    pub fn is_addressable(&self) -> bool {
        !self.name.is_empty() && !self.selector.is_empty()
    }

    pub fn clear_resource_version(&mut self) {
        self.resource_version = None;
    }

    /// Copy of this spec with a different replica count and no revision.
    pub fn with_replicas(&self, replicas: u32) -> Self {
        Self {
            replicas,
            resource_version: None,
            ..self.clone()
        }
    }
}
