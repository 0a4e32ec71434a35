// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes, including rollout status events.

use serde::Serialize;
use std::time::Instant;

use crate::update::{UpdatePhase, UpdateStatus};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
#[derive(Debug, Clone)]
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration_secs(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a rollout status change.
    ///
    /// Normal mode prints every change; quiet mode only terminal phases; JSON
    /// mode emits one `status` event per change.
    pub fn status(&self, rollout: &str, status: &UpdateStatus) {
        match self.mode {
            OutputMode::Normal => println!("  {rollout}: {}", describe(status)),
            OutputMode::Quiet => {
                if status.phase.is_terminal() {
                    println!("{rollout}: {}", describe(status));
                }
            }
            OutputMode::Json => {
                let event = StatusEvent {
                    event: "status",
                    rollout,
                    status,
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => self.emit_json("success", message, false),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => self.emit_json("error", message, true),
        }
    }

    fn emit_json(&self, event: &str, message: &str, to_stderr: bool) {
        let event = JsonEvent {
            event,
            message,
            duration_secs: self.duration_secs(),
        };
        if let Ok(json) = serde_json::to_string(&event) {
            if to_stderr {
                eprintln!("{json}");
            } else {
                println!("{json}");
            }
        }
    }
}

fn describe(status: &UpdateStatus) -> String {
    let counts = format!(
        "old={}, new={}",
        status.old_replica_count, status.new_replica_count
    );
    match (&status.phase, &status.reason) {
        (UpdatePhase::Failed, Some(reason)) => format!("{} ({counts}): {reason}", status.phase),
        (phase, _) => format!("{phase} ({counts})"),
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct StatusEvent<'a> {
    event: &'a str,
    rollout: &'a str,
    #[serde(flatten)]
    status: &'a UpdateStatus,
}
