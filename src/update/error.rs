// ABOUTME: Error types for rolling update operations.
// ABOUTME: Display text doubles as the failure reason recorded on the update status.

use std::fmt;
use std::time::Duration;

use crate::cluster::ClusterError;
use crate::types::{ReplicaCounts, WorkloadName};

/// Point in a step where a cancellation was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptPoint {
    BeforeFirstAction,
    BeforeSecondAction,
    WaitingForReady,
}

impl fmt::Display for InterruptPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterruptPoint::BeforeFirstAction => {
                write!(f, "when before first step in two step update")
            }
            InterruptPoint::BeforeSecondAction => {
                write!(f, "when before second step in two step update")
            }
            InterruptPoint::WaitingForReady => write!(f, "in waiting for once update ready"),
        }
    }
}

/// Errors that end a rollout (or refuse to start one).
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// A workload spec lacks a name or selector.
    #[error("{0} workload is missing a name or selector")]
    Validation(super::Side),

    #[error("old replication controller {0} is not exist")]
    OldWorkloadMissing(WorkloadName),

    #[error("create new replication controller {0} failed")]
    CreateFailed(WorkloadName),

    #[error("old replication controller delete failed")]
    DeleteFailed(WorkloadName),

    #[error(
        "check update status failed with oldPodReadyCount={}, newPodReadyCount={}, but require minPodReadyCount={min}, maxPodReadCount={max}",
        .observed.old,
        .observed.new
    )]
    BoundsViolation {
        observed: ReplicaCounts,
        min: u32,
        max: u32,
    },

    #[error("wait for once update ready timeout")]
    ReadinessTimeout {
        workload: WorkloadName,
        waited: Duration,
    },

    #[error("pods of {0} disappeared while waiting for ready")]
    PodsDisappeared(WorkloadName),

    #[error("thread is interrupted {0}")]
    Interrupted(InterruptPoint),

    #[error("desire old pod count is 0, but get {0}, stop delete and fail update")]
    OldPodsRemain(u32),

    #[error("{driver} failed with message={source}")]
    Driver {
        driver: &'static str,
        source: ClusterError,
    },

    #[error("update is already running")]
    AlreadyRunning,

    #[error("update has already finished")]
    AlreadyFinished,
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateErrorKind {
    Validation,
    ResourceMissing,
    ResourceCreateFailed,
    ResourceDeleteFailed,
    BoundsViolation,
    ReadinessTimeout,
    PodsDisappeared,
    Interrupted,
    PostconditionViolation,
    Driver,
    AlreadyRunning,
    AlreadyFinished,
}

impl UpdateError {
    pub(crate) fn driver(driver: &'static str, source: ClusterError) -> Self {
        UpdateError::Driver { driver, source }
    }

    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> UpdateErrorKind {
        match self {
            UpdateError::Validation(_) => UpdateErrorKind::Validation,
            UpdateError::OldWorkloadMissing(_) => UpdateErrorKind::ResourceMissing,
            UpdateError::CreateFailed(_) => UpdateErrorKind::ResourceCreateFailed,
            UpdateError::DeleteFailed(_) => UpdateErrorKind::ResourceDeleteFailed,
            UpdateError::BoundsViolation { .. } => UpdateErrorKind::BoundsViolation,
            UpdateError::ReadinessTimeout { .. } => UpdateErrorKind::ReadinessTimeout,
            UpdateError::PodsDisappeared(_) => UpdateErrorKind::PodsDisappeared,
            UpdateError::Interrupted(_) => UpdateErrorKind::Interrupted,
            UpdateError::OldPodsRemain(_) => UpdateErrorKind::PostconditionViolation,
            UpdateError::Driver { .. } => UpdateErrorKind::Driver,
            UpdateError::AlreadyRunning => UpdateErrorKind::AlreadyRunning,
            UpdateError::AlreadyFinished => UpdateErrorKind::AlreadyFinished,
        }
    }
}
