// ABOUTME: Simulate command implementation.
// ABOUTME: Runs each planned rollout in order against an in-memory cluster and reports status changes.

use rollstep::cluster::InMemoryCluster;
use rollstep::config::{Config, RolloutPlan};
use rollstep::error::{Error, Result};
use rollstep::output::Output;
use rollstep::update::{RollingUpdater, StatusListener, UpdatePhase, UpdateStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

/// How often the final status is re-read while no change arrives.
const STATUS_POLL: Duration = Duration::from_millis(250);

/// Run every rollout of the plan, stopping at the first failure.
pub async fn simulate(config: Config, mut output: Output) -> Result<()> {
    config.validate()?;
    output.start_timer();

    let cluster = Arc::new(InMemoryCluster::new(config.simulation.ready_delay));
    for plan in config.rollouts.iter() {
        cluster.insert_workload(&plan.old);
    }
    for workload in &config.simulation.existing {
        cluster.insert_workload(workload);
    }

    output.progress(&format!(
        "Simulating {} rollout(s)",
        config.rollouts.len()
    ));

    for plan in config.rollouts.iter() {
        let label = plan.label();
        output.progress(&format!("→ {label}"));

        let status = run_rollout(&cluster, plan, &label, &output).await?;
        if status.phase == UpdatePhase::Failed {
            return Err(Error::RolloutFailed {
                rollout: label,
                reason: status.reason.unwrap_or_default(),
            });
        }
    }

    output.success("Simulation complete!");
    Ok(())
}

async fn run_rollout(
    cluster: &Arc<InMemoryCluster>,
    plan: &RolloutPlan,
    label: &str,
    output: &Output,
) -> Result<UpdateStatus> {
    let listener: StatusListener = {
        let output = output.clone();
        let label = label.to_string();
        Arc::new(move |status: &UpdateStatus| output.status(&label, status))
    };

    let updater = RollingUpdater::with_listener(
        Arc::clone(cluster),
        plan.old_target(),
        plan.new.clone(),
        plan.policy.clone(),
        Some(listener),
    );

    let mut changes = updater.subscribe();
    updater.start(&Handle::current())?;

    // A skipped rollout publishes nothing, so the status is also re-read on a
    // timer; `status()` marks a silently finished task as failed.
    loop {
        let status = updater.status();
        if status.phase.is_terminal() {
            debug!(rollout = label, phase = %status.phase, "rollout finished");
            return Ok(status);
        }
        let _ = tokio::time::timeout(STATUS_POLL, changes.changed()).await;
    }
}
