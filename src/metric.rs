//! The metric computation contract.
//!
//! A metric computation turns raw artifacts into a [`MetricValue`]. It is
//! invoked only through the [`ComputedArtifacts`] cache, which guarantees it
//! runs at most once per artifacts set within a run.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::artifacts::{ArtifactKey, Artifacts};
use crate::cache::ComputedArtifacts;
use crate::error::AuditError;

/// Identifies a metric computation, e.g. `time-to-interactive`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputationId(String);

impl ComputationId {
    /// Creates an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComputationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComputationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A derived metric: one primary value plus optional named sub-timings.
///
/// All values are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValue {
    /// The primary value gates compare against their threshold
    pub value_ms: f64,
    /// Named sub-timings, in name order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub timings: BTreeMap<String, f64>,
}

impl MetricValue {
    /// Creates a metric with only a primary value.
    pub fn new(value_ms: f64) -> Self {
        Self {
            value_ms,
            timings: BTreeMap::new(),
        }
    }

    /// Adds a named sub-timing.
    pub fn with_timing(mut self, name: impl Into<String>, value_ms: f64) -> Self {
        self.timings.insert(name.into(), value_ms);
        self
    }

    /// Looks up a sub-timing by name.
    pub fn timing(&self, name: &str) -> Option<f64> {
        self.timings.get(name).copied()
    }
}

/// A pure function from artifacts to a metric.
///
/// Implementations must return the same value for the same artifacts; the
/// cache relies on it when it hands one result to every requester.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use audit_pipeline::{
///     ArtifactKey, AuditError, ComputationId, ComputeContext, MetricComputation, MetricValue,
///     DEFAULT_PASS,
/// };
///
/// struct EventCount;
///
/// #[async_trait(?Send)]
/// impl MetricComputation for EventCount {
///     fn id(&self) -> ComputationId {
///         ComputationId::new("event-count")
///     }
///
///     fn required_artifacts(&self) -> Vec<ArtifactKey> {
///         vec![ArtifactKey::traces(DEFAULT_PASS)]
///     }
///
///     async fn compute(&self, ctx: &ComputeContext<'_>) -> Result<MetricValue, AuditError> {
///         let events = ctx.artifacts().trace_events(DEFAULT_PASS)?;
///         Ok(MetricValue::new(events.len() as f64))
///     }
/// }
/// ```
#[async_trait(?Send)]
pub trait MetricComputation {
    /// The identifier this computation is registered under.
    fn id(&self) -> ComputationId;

    /// Artifact keys that must be present before `compute` is invoked.
    fn required_artifacts(&self) -> Vec<ArtifactKey>;

    /// Other computations this one requests through the cache.
    ///
    /// Only these may be passed to [`ComputeContext::request`]; the cache
    /// walks this graph on first use to reject cycles before anything runs.
    fn dependencies(&self) -> Vec<ComputationId> {
        Vec::new()
    }

    /// Computes the metric.
    ///
    /// Dependencies must be requested with [`ComputeContext::request`] so they
    /// share the run's memoization.
    async fn compute(&self, ctx: &ComputeContext<'_>) -> Result<MetricValue, AuditError>;
}

/// What a running computation can see: the artifacts, and the cache it was
/// invoked from.
pub struct ComputeContext<'a> {
    cache: &'a ComputedArtifacts,
    artifacts: &'a Rc<Artifacts>,
    chain: &'a [ComputationId],
    declared: &'a [ComputationId],
}

impl<'a> ComputeContext<'a> {
    pub(crate) fn new(
        cache: &'a ComputedArtifacts,
        artifacts: &'a Rc<Artifacts>,
        chain: &'a [ComputationId],
        declared: &'a [ComputationId],
    ) -> Self {
        Self {
            cache,
            artifacts,
            chain,
            declared,
        }
    }

    /// The artifacts of the current run.
    pub fn artifacts(&self) -> &Artifacts {
        self.artifacts
    }

    /// The computation currently running.
    pub fn current(&self) -> Option<&ComputationId> {
        self.chain.last()
    }

    /// Requests another computation over the same artifacts.
    ///
    /// Goes through the run's cache, so a dependency shared by several
    /// computations still runs once.
    ///
    /// # Errors
    ///
    /// Fails with an undeclared-dependency error when `id` is not listed in
    /// the running computation's [`MetricComputation::dependencies`], with a
    /// cyclic-computation error when `id` is already being computed further
    /// up this request chain, and otherwise propagates whatever the
    /// dependency failed with.
    pub async fn request(&self, id: &ComputationId) -> Result<Rc<MetricValue>, AuditError> {
        if !self.declared.contains(id) {
            let from = self
                .current()
                .cloned()
                .unwrap_or_else(|| ComputationId::new("<unknown>"));
            return Err(AuditError::undeclared_dependency(from, id.clone()));
        }
        self.cache
            .get_in_chain(id, self.artifacts, self.chain.to_vec())
            .await
    }

    /// Wraps `cause` as a failure of the running computation.
    pub fn failure(&self, cause: impl StdError + 'static) -> AuditError {
        let id = self
            .current()
            .cloned()
            .unwrap_or_else(|| ComputationId::new("<unknown>"));
        AuditError::computation(id, cause)
    }
}

impl fmt::Debug for ComputeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputeContext")
            .field("chain", &self.chain)
            .field("declared", &self.declared)
            .finish_non_exhaustive()
    }
}
