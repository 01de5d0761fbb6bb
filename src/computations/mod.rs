//! Built-in metric computations.
//!
//! These are reference implementations of the [`MetricComputation`] contract.
//! `time-to-interactive` requests `trace-of-tab` through the cache, so the
//! trace is scanned for navigation anchors once per run no matter how many
//! computations need them.
//!
//! [`MetricComputation`]: crate::MetricComputation

mod time_to_interactive;
mod trace_of_tab;

pub use time_to_interactive::TimeToInteractive;
pub use trace_of_tab::TraceOfTab;

use crate::ComputationRegistry;

/// A registry holding every built-in computation.
pub fn default_registry() -> ComputationRegistry {
    ComputationRegistry::new()
        .with(TraceOfTab)
        .with(TimeToInteractive)
}

/// Converts a trace timestamp in microseconds to milliseconds.
pub(crate) fn us_to_ms(us: u64) -> f64 {
    us as f64 / 1000.0
}
