// ABOUTME: Configuration types and parsing for rollstep.yml.
// ABOUTME: Handles YAML parsing, config discovery and validation of rollout plans.

mod deserialize;
mod init;
mod rollout;
mod simulation;

pub use init::init_config;
pub use rollout::RolloutPlan;
pub use simulation::SimulationConfig;

use crate::error::{Error, Result};
use crate::types::{LabelSelector, ReplicatedWorkload};
use deserialize::deserialize_rollouts;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILENAME: &str = "rollstep.yml";
pub const CONFIG_FILENAME_ALT: &str = "rollstep.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".rollstep/config.yml";

/// A rollout plan file: the rollouts to run, in order.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_rollouts")]
    pub rollouts: NonEmpty<RolloutPlan>,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Check every rollout for problems the parser cannot catch.
    ///
    /// Workloads without a name or selector would make the updater skip the
    /// rollout silently, and overlapping selectors would count the same pods
    /// on both sides, so both are reported here. All problems are collected
    /// into a single `InvalidConfig` error.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        for (i, plan) in self.rollouts.iter().enumerate() {
            problems.extend(plan.problems(&format!("rollouts[{i}]")));
        }

        for (i, workload) in self.simulation.existing.iter().enumerate() {
            if workload.name.is_empty() {
                problems.push(format!("simulation.existing[{i}]: workload has no name"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfig(problems.join("; ")))
        }
    }

    pub fn template() -> Result<Self> {
        let selector = |version: &str| {
            LabelSelector::from_pairs([("app", "web"), ("version", version)])
                .map_err(|e| Error::InvalidConfig(format!("template selector: {e}")))
        };

        Ok(Config {
            rollouts: NonEmpty::new(RolloutPlan {
                old: ReplicatedWorkload::new("web-v1", selector("v1")?, 3),
                new: ReplicatedWorkload::new("web-v2", selector("v2")?, 3),
                retain_old: 0,
                policy: None,
            }),
            simulation: SimulationConfig::default(),
        })
    }
}
