// ABOUTME: Command module aggregator for the rollstep CLI.
// ABOUTME: Re-exports the validate and simulate command handlers.

mod simulate;
mod validate;

pub use simulate::simulate;
pub use validate::validate;
