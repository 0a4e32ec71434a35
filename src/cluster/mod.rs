// ABOUTME: Cluster boundary: the client capability trait and its error type.
// ABOUTME: Also ships an in-memory cluster for simulation and tests.

mod client;
mod error;
mod memory;

pub use client::ClusterClient;
pub use error::{ClusterError, ClusterErrorKind, ConflictSnafu, DriverSnafu, TransportSnafu};
pub use memory::{ClusterCall, InMemoryCluster};
