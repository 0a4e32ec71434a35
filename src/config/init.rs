// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates rollstep.yml template files.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let yaml = generate_template_yaml(&Config::template()?);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    let plan = config.rollouts.first();
    let ready_delay = config
        .simulation
        .ready_delay
        .map(|d| format!("{}ms", d.as_millis()))
        .unwrap_or_else(|| "null".to_string());

    format!(
        r#"rollouts:
  - old:
      name: {}
      selector: "{}"
      replicas: {}
    new:
      name: {}
      selector: "{}"
      replicas: {}
    # Old replicas to keep once the rollout is done. With 0 the old workload is deleted.
    retain_old: {}
    # Uncomment to run a single step of your own instead of the rolling strategy.
    # policy:
    #   old_replica_count: 0
    #   new_replica_count: 3
    #   remove_old_first: false
    #   second_action_delay: 1s
    #   min_pod_ready_count: 0
    #   max_pod_ready_count: 0
    #   max_time_for_ready: 5m
    #   check_ready_period: 2s

simulation:
  # How long a new pod takes to become ready in `rollstep simulate`.
  ready_delay: {}
"#,
        plan.old.name,
        plan.old.selector,
        plan.old.replicas,
        plan.new.name,
        plan.new.selector,
        plan.new.replicas,
        plan.retain_old,
        ready_delay,
    )
}
