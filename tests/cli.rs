// ABOUTME: Integration tests for the rollstep CLI commands.
// ABOUTME: Validates --help output and the init, validate and simulate commands.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn rollstep_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("rollstep"))
}

const FAST_PLAN: &str = r#"
rollouts:
  - old: { name: web-v1, selector: "app=web,version=v1", replicas: 2 }
    new: { name: web-v2, selector: "app=web,version=v2", replicas: 2 }
simulation:
  ready_delay: 0s
"#;

#[test]
fn help_shows_commands() {
    rollstep_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("simulate"));
}

#[test]
fn init_creates_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("rollstep.yml");

    rollstep_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created rollstep.yml"));

    assert!(config_path.exists(), "rollstep.yml should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("rollouts:"), "Config should have rollouts");
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("rollstep.yml");

    fs::write(&config_path, "existing: config").unwrap();

    rollstep_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn validate_accepts_generated_template() {
    let temp_dir = tempfile::tempdir().unwrap();

    rollstep_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .success();

    rollstep_cmd()
        .current_dir(temp_dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("web-v1 -> web-v2"))
        .stdout(predicate::str::contains("rolling"))
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn validate_reports_problems() {
    let temp_dir = tempfile::tempdir().unwrap();
    let plan = temp_dir.path().join("plan.yml");
    fs::write(
        &plan,
        r#"
rollouts:
  - old: { name: web, selector: "app=web" }
    new: { name: web, selector: "app=web,version=v2" }
"#,
    )
    .unwrap();

    rollstep_cmd()
        .args(["validate", "--config"])
        .arg(&plan)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"))
        .stderr(predicate::str::contains("share the name 'web'"));
}

#[test]
fn validate_without_config_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    rollstep_cmd()
        .current_dir(temp_dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn simulate_runs_rollout_to_completion() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("rollstep.yml"), FAST_PLAN).unwrap();

    rollstep_cmd()
        .current_dir(temp_dir.path())
        .arg("simulate")
        .assert()
        .success()
        .stdout(predicate::str::contains("web-v1 -> web-v2: running"))
        .stdout(predicate::str::contains("succeed (old=0, new=2)"))
        .stdout(predicate::str::contains("Simulation complete!"));
}

#[test]
fn simulate_quiet_prints_only_final_status() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("rollstep.yml"), FAST_PLAN).unwrap();

    rollstep_cmd()
        .current_dir(temp_dir.path())
        .args(["--quiet", "simulate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("succeed"))
        .stdout(predicate::str::contains("running").not());
}

#[test]
fn simulate_json_emits_status_events() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("rollstep.yml"), FAST_PLAN).unwrap();

    let output = rollstep_cmd()
        .current_dir(temp_dir.path())
        .args(["--json", "simulate"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let events: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert!(events.iter().any(|e| e["event"] == "status" && e["phase"] == "succeed"));
    assert_eq!(events.last().unwrap()["event"], "success");
}

#[test]
fn simulate_fails_when_new_pods_never_turn_ready() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("rollstep.yml"),
        r#"
rollouts:
  - old: { name: web-v1, selector: "app=web,version=v1", replicas: 1 }
    new: { name: web-v2, selector: "app=web,version=v2", replicas: 1 }
    policy:
      new_replica_count: 1
      max_time_for_ready: 300ms
      check_ready_period: 100ms
simulation:
  ready_delay: null
"#,
    )
    .unwrap();

    rollstep_cmd()
        .current_dir(temp_dir.path())
        .arg("simulate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("rollout web-v1 -> web-v2 failed"))
        .stderr(predicate::str::contains("wait for once update ready timeout"));
}
