// ABOUTME: Library root for rollstep - exposes the updater and its collaborators.
// ABOUTME: The CLI binary is in main.rs.

pub mod cluster;
pub mod config;
pub mod error;
pub mod output;
pub mod types;
pub mod update;
