// ABOUTME: Rolling update orchestration from an old replicated workload to a new one.
// ABOUTME: Exports the updater, strategies, step policy, status tracking and errors.

mod bounds;
mod error;
mod policy;
mod status;
mod strategy;
mod updater;
mod waiter;

pub use bounds::check_ready_bounds;
pub use error::{InterruptPoint, UpdateError, UpdateErrorKind};
pub use policy::{Side, UpdatePolicy};
pub use status::{StatusListener, StatusTracker, UpdatePhase, UpdateStatus};
pub use strategy::{
    ROLLING_CHECK_READY_PERIOD, ROLLING_MAX_TIME_FOR_READY, RollingStrategy, UpdateStrategy,
    UserDesignedStrategy,
};
pub use updater::{RollingUpdater, STOP_GRACE, UNKNOWN_TERMINATION, UpdateOutcome};
pub use waiter::{MIN_CHECK_PERIOD, ReadinessWaiter};
