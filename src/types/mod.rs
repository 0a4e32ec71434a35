// ABOUTME: Domain types: resource names, selectors, workloads, pods and counts.
// ABOUTME: Uses phantom types to keep workload and pod names apart at compile time.

mod counts;
mod name;
mod pod;
mod selector;
mod workload;

pub use counts::ReplicaCounts;
pub use name::{Name, PodName, WorkloadName};
pub use pod::{Pod, PodPhase, ready_count};
pub use selector::{LabelSelector, SelectorError};
pub use workload::ReplicatedWorkload;
