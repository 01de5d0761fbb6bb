use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RUN: AtomicU64 = AtomicU64::new(1);

/// A structured logging handle scoped to one audit run.
///
/// `RunLog` is obtained from the run's cache and is lifetime-bound to it.
/// All messages carry the run id and the pipeline component that emitted
/// them, so concurrent runs can be told apart in the output.
///
/// Nothing here reports errors: failures travel back to the caller as
/// [`AuditError`](crate::AuditError) values.
#[derive(Debug, Clone, Copy)]
pub struct RunLog<'a> {
    run_id: &'a str,
}

impl<'a> RunLog<'a> {
    /// Creates a new RunLog for a run.
    ///
    /// This is `pub(crate)` - only the cache hands these out.
    pub(crate) fn new(run_id: &'a str) -> Self {
        Self { run_id }
    }

    /// Generates a process-unique run id such as `run-7`.
    pub(crate) fn next_run_id() -> String {
        format!("run-{}", NEXT_RUN.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the run ID associated with this logger.
    pub fn run_id(&self) -> &str {
        self.run_id
    }

    /// Logs a debug-level message with run ID.
    ///
    /// Use with `format_args!` for efficient formatting.
    pub fn debug(&self, component: &'static str, args: fmt::Arguments<'_>) {
        tracing::debug!(run_id = %self.run_id, component, "{}", args);
    }

    /// Logs a trace-level message with run ID.
    pub fn trace(&self, component: &'static str, args: fmt::Arguments<'_>) {
        tracing::trace!(run_id = %self.run_id, component, "{}", args);
    }
}
