// ABOUTME: Cluster client capability trait consumed by the rolling updater.
// ABOUTME: Get, create, scale and delete workloads; list and delete pods.

use async_trait::async_trait;

use super::error::ClusterError;
use crate::types::{LabelSelector, Pod, PodName, ReplicatedWorkload, WorkloadName};

/// Workload and pod operations against a cluster.
///
/// Every call may fail with a [`ClusterError`]; the updater treats any such
/// failure as fatal for the rollout.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Name used in failure reasons ("<driver> failed with message=...").
    fn driver_name(&self) -> &'static str {
        "Kubernetes"
    }

    /// Look up a workload by name. `None` when it does not exist.
    async fn get_workload(
        &self,
        name: &WorkloadName,
    ) -> Result<Option<ReplicatedWorkload>, ClusterError>;

    /// Create a workload. `None` when the cluster declined to create it.
    async fn create_workload(
        &self,
        spec: &ReplicatedWorkload,
    ) -> Result<Option<ReplicatedWorkload>, ClusterError>;

    /// Set the replica count of an existing workload.
    async fn scale_workload(&self, name: &WorkloadName, replicas: u32)
    -> Result<(), ClusterError>;

    /// Delete a workload. `false` when the deletion did not happen.
    async fn delete_workload(&self, name: &WorkloadName) -> Result<bool, ClusterError>;

    /// List pods matching a selector. `None` when the listing is unavailable.
    async fn list_pods(&self, selector: &LabelSelector) -> Result<Option<Vec<Pod>>, ClusterError>;

    /// Delete a single pod.
    async fn delete_pod(&self, name: &PodName) -> Result<(), ClusterError>;

    /// Remove pods from the listing that are not running. Best effort.
    async fn clear_not_running_pods(&self, pods: &[Pod]);
}
