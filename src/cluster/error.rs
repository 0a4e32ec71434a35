// ABOUTME: Cluster client error types with SNAFU pattern.
// ABOUTME: Every variant is a driver or transport failure that aborts a rollout.

use snafu::Snafu;

/// Failure raised by a cluster client call.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ClusterError {
    #[snafu(display("{operation} failed: {message}"))]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[snafu(display("{operation} rejected by driver: {message}"))]
    Driver {
        operation: &'static str,
        message: String,
    },

    #[snafu(display("conflict on {resource}: {message}"))]
    Conflict { resource: String, message: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterErrorKind {
    /// The request never got a usable answer.
    Transport,
    /// The cluster answered with an error.
    Driver,
    /// Stale revision or name clash.
    Conflict,
}

impl ClusterError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ClusterErrorKind {
        match self {
            ClusterError::Transport { .. } => ClusterErrorKind::Transport,
            ClusterError::Driver { .. } => ClusterErrorKind::Driver,
            ClusterError::Conflict { .. } => ClusterErrorKind::Conflict,
        }
    }
}
