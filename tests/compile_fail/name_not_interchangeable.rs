// ABOUTME: Compile-fail test verifying WorkloadName and PodName are not interchangeable.
// ABOUTME: This test should fail to compile, validating type safety.

use rollstep::types::{PodName, WorkloadName};

fn takes_pod_name(_name: PodName) {}

fn main() {
    let workload = WorkloadName::new("web-v1");
    takes_pod_name(workload); // ERROR: expected PodName, found WorkloadName
}
