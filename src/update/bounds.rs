// ABOUTME: Combined ready-pod bounds enforced around every action of a step.
// ABOUTME: A zero bound means the range is open on that side.

use super::UpdatePolicy;
use super::error::UpdateError;
use crate::types::ReplicaCounts;

/// Check the combined ready count of both workloads against the policy.
pub fn check_ready_bounds(policy: &UpdatePolicy, ready: ReplicaCounts) -> Result<(), UpdateError> {
    let min = policy.min_pod_ready_count;
    let max = policy.max_pod_ready_count;
    let total = ready.total();

    if (min > 0 && total < min) || (max > 0 && total > max) {
        return Err(UpdateError::BoundsViolation {
            observed: ready,
            min,
            max,
        });
    }
    Ok(())
}
