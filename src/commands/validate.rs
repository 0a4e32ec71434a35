// ABOUTME: Validate command implementation.
// ABOUTME: Checks a parsed plan and summarizes each rollout it contains.

use rollstep::config::Config;
use rollstep::error::Result;
use rollstep::output::Output;
use rollstep::update::UpdateStrategy;

pub fn validate(config: &Config, output: &Output) -> Result<()> {
    config.validate()?;

    for plan in config.rollouts.iter() {
        let strategy = UpdateStrategy::for_policy(plan.policy.clone());
        output.progress(&format!(
            "  {}: {} old -> {} new ({})",
            plan.label(),
            plan.old.replicas,
            plan.new.replicas,
            strategy.name()
        ));
    }

    output.success(&format!(
        "Configuration is valid ({} rollout(s))",
        config.rollouts.len()
    ));
    Ok(())
}
