//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use audit_pipeline::{
    ArtifactKey, Artifacts, AuditError, ComputationFailure, ComputationId, ComputeContext,
    MetricComputation, MetricValue, PassArtifacts, DEFAULT_PASS,
};
use futures::channel::oneshot;

/// Stands in for the real time-to-interactive computation.
///
/// Registered under the production identifier so gates pick it up unchanged.
pub struct StubTti {
    outcome: Result<f64, &'static str>,
    calls: Rc<Cell<usize>>,
    hold: RefCell<Option<oneshot::Receiver<()>>>,
}

impl StubTti {
    pub fn returning(value_ms: f64, calls: &Rc<Cell<usize>>) -> Self {
        Self {
            outcome: Ok(value_ms),
            calls: Rc::clone(calls),
            hold: RefCell::new(None),
        }
    }

    pub fn failing(message: &'static str, calls: &Rc<Cell<usize>>) -> Self {
        Self {
            outcome: Err(message),
            calls: Rc::clone(calls),
            hold: RefCell::new(None),
        }
    }

    /// Suspends inside `compute` until the sender fires.
    pub fn held_until(mut self, release: oneshot::Receiver<()>) -> Self {
        self.hold = RefCell::new(Some(release));
        self
    }
}

#[async_trait(?Send)]
impl MetricComputation for StubTti {
    fn id(&self) -> ComputationId {
        ComputationId::new("time-to-interactive")
    }

    fn required_artifacts(&self) -> Vec<ArtifactKey> {
        vec![ArtifactKey::traces(DEFAULT_PASS)]
    }

    async fn compute(&self, ctx: &ComputeContext<'_>) -> Result<MetricValue, AuditError> {
        self.calls.set(self.calls.get() + 1);

        let hold = self.hold.borrow_mut().take();
        if let Some(release) = hold {
            let _ = release.await;
        }

        match self.outcome {
            Ok(value) => Ok(MetricValue::new(value).with_timing("timeToInteractive", value)),
            Err(message) => Err(ctx.failure(ComputationFailure::new(message))),
        }
    }
}

/// Artifacts with an empty default-pass trace and no network records.
pub fn default_artifacts() -> Rc<Artifacts> {
    Rc::new(Artifacts::new().with_pass(
        DEFAULT_PASS,
        PassArtifacts::with_trace(Vec::new()).network_records(Vec::new()),
    ))
}

pub fn calls() -> Rc<Cell<usize>> {
    Rc::new(Cell::new(0))
}
