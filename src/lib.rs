//! Audit evaluation over recorded execution traces.
//!
//! This crate turns a recorded trace into a pass/fail verdict in three steps:
//! - **Metric computations** derive a performance metric from raw artifacts
//! - **The computed-artifact cache** runs each computation at most once per run
//! - **Policy gates** compare the metric with a fixed threshold
//!
//! # Core Types
//!
//! - [`Artifacts`]: Raw per-pass trace events and network records
//! - [`MetricComputation`]: Contract for a pure artifacts → metric function
//! - [`ComputedArtifacts`]: Per-run memoization of computations
//! - [`PolicyGate`]: Configured threshold check producing an [`AuditResult`]
//! - [`AuditError`]: Why a gate could not be evaluated
//!
//! A metric that misses its threshold is a normal result with
//! `raw_value == false`. An [`AuditError`] means the metric could not be
//! determined at all.
//!
//! # Examples
//!
//! ```
//! use audit_pipeline::{Artifacts, AuditRun, PassArtifacts, PolicyGate, TraceEvent, DEFAULT_PASS};
//! use audit_pipeline::computations::default_registry;
//!
//! let trace = vec![
//!     TraceEvent::instant("navigationStart", "blink.user_timing", 0),
//!     TraceEvent::instant("firstMeaningfulPaint", "loading", 1_500_000),
//!     TraceEvent::complete("RunTask", "toplevel", 11_000_000, 400_000),
//!     TraceEvent::instant("tracingEnd", "misc", 30_000_000),
//! ];
//! let artifacts = Artifacts::new().with_pass(DEFAULT_PASS, PassArtifacts::with_trace(trace));
//! let run = AuditRun::new(default_registry(), artifacts);
//!
//! let result = futures::executor::block_on(run.evaluate(&PolicyGate::load_fast_enough_for_pwa()))
//!     .expect("trace is complete");
//! assert!(result.raw_value);
//! assert_eq!(result.extended_info.number("timeToInteractive"), Some(1500.0));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod artifacts;
pub mod audits;
mod cache;
pub mod computations;
mod error;
mod gate;
mod logging;
mod metric;
mod policy;
mod result;
mod run;

pub use artifacts::{ArtifactKey, Artifacts, NetworkRecord, PassArtifacts, TraceEvent, DEFAULT_PASS};
pub use cache::{ComputationRegistry, ComputedArtifacts};
pub use error::{AuditError, ComputationFailure, ErrorKind};
pub use gate::PolicyGate;
pub use logging::RunLog;
pub use metric::{ComputationId, ComputeContext, MetricComputation, MetricValue};
pub use policy::{Comparison, GateConfig};
pub use result::{AuditResult, ExtendedInfo, FormatterTag};
pub use run::AuditRun;
