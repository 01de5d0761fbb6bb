//! One audit run: one artifacts set, one cache.

use std::rc::Rc;

use futures::future::join_all;

use crate::artifacts::Artifacts;
use crate::cache::{ComputationRegistry, ComputedArtifacts};
use crate::error::AuditError;
use crate::gate::PolicyGate;
use crate::result::AuditResult;

/// Pairs a fresh [`ComputedArtifacts`] cache with the artifacts it serves.
///
/// Dropping the run drops every memoized metric; nothing is reused by the
/// next run.
///
/// # Examples
///
/// ```
/// use audit_pipeline::{Artifacts, AuditRun, PassArtifacts, PolicyGate, TraceEvent, DEFAULT_PASS};
/// use audit_pipeline::computations::default_registry;
///
/// let trace = vec![
///     TraceEvent::instant("navigationStart", "blink.user_timing", 0),
///     TraceEvent::instant("firstMeaningfulPaint", "loading", 2_000_000),
///     TraceEvent::instant("tracingEnd", "misc", 9_000_000),
/// ];
/// let run = AuditRun::new(
///     default_registry(),
///     Artifacts::new().with_pass(DEFAULT_PASS, PassArtifacts::with_trace(trace)),
/// );
///
/// let result = futures::executor::block_on(run.evaluate(&PolicyGate::load_fast_enough_for_pwa()))
///     .expect("metric computed");
/// assert!(result.raw_value);
/// assert_eq!(result.display_value, "2,000 ms");
/// ```
#[derive(Debug)]
pub struct AuditRun {
    cache: ComputedArtifacts,
    artifacts: Rc<Artifacts>,
}

impl AuditRun {
    /// Starts a run over `artifacts`.
    pub fn new(registry: ComputationRegistry, artifacts: Artifacts) -> Self {
        Self {
            cache: ComputedArtifacts::new(registry),
            artifacts: Rc::new(artifacts),
        }
    }

    /// The run's cache.
    pub fn cache(&self) -> &ComputedArtifacts {
        &self.cache
    }

    /// The run's artifacts.
    pub fn artifacts(&self) -> &Rc<Artifacts> {
        &self.artifacts
    }

    /// Evaluates one gate.
    pub async fn evaluate(&self, gate: &PolicyGate) -> Result<AuditResult, AuditError> {
        gate.evaluate(&self.cache, &self.artifacts).await
    }

    /// Evaluates several gates concurrently, returning outcomes in gate order.
    ///
    /// One gate failing to evaluate does not stop the others.
    pub async fn evaluate_all(&self, gates: &[PolicyGate]) -> Vec<Result<AuditResult, AuditError>> {
        join_all(gates.iter().map(|gate| self.evaluate(gate))).await
    }
}
