//! The computed-artifact cache.
//!
//! One [`ComputedArtifacts`] instance lives for exactly one audit run. For each
//! (computation, artifacts) pair it runs the computation at most once and
//! hands the same result, or the same error, to every requester.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};

use crate::artifacts::Artifacts;
use crate::error::AuditError;
use crate::logging::RunLog;
use crate::metric::{ComputationId, ComputeContext, MetricComputation, MetricValue};

type MetricFuture = Shared<LocalBoxFuture<'static, Result<Rc<MetricValue>, AuditError>>>;

/// The set of metric computations available to a run.
///
/// Computations are injected here rather than looked up globally; a test can
/// register a stub under a production identifier.
///
/// # Examples
///
/// ```
/// use audit_pipeline::ComputationRegistry;
/// use audit_pipeline::computations::{TimeToInteractive, TraceOfTab};
///
/// let registry = ComputationRegistry::new()
///     .with(TraceOfTab)
///     .with(TimeToInteractive);
///
/// assert_eq!(registry.len(), 2);
/// assert!(registry.contains(&"time-to-interactive".into()));
/// ```
#[derive(Clone, Default)]
pub struct ComputationRegistry {
    computations: HashMap<ComputationId, Rc<dyn MetricComputation>>,
}

impl ComputationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a computation under its own identifier, replacing any
    /// previous registration.
    pub fn register(&mut self, computation: impl MetricComputation + 'static) {
        self.register_rc(Rc::new(computation));
    }

    /// Registers an already shared computation.
    pub fn register_rc(&mut self, computation: Rc<dyn MetricComputation>) {
        self.computations.insert(computation.id(), computation);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, computation: impl MetricComputation + 'static) -> Self {
        self.register(computation);
        self
    }

    /// Returns true if `id` is registered.
    pub fn contains(&self, id: &ComputationId) -> bool {
        self.computations.contains_key(id)
    }

    /// Number of registered computations.
    pub fn len(&self) -> usize {
        self.computations.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.computations.is_empty()
    }

    fn get(&self, id: &ComputationId) -> Option<Rc<dyn MetricComputation>> {
        self.computations.get(id).cloned()
    }
}

impl fmt::Debug for ComputationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.computations.keys().collect();
        ids.sort();
        f.debug_struct("ComputationRegistry")
            .field("computations", &ids)
            .finish()
    }
}

// Artifacts are keyed by allocation; each entry holds an `Rc` to them so the
// address stays unique for the life of the cache.
type EntryKey = (ComputationId, *const Artifacts);

struct Entry {
    _artifacts: Rc<Artifacts>,
    result: MetricFuture,
}

struct CacheInner {
    run_id: String,
    registry: ComputationRegistry,
    entries: RefCell<HashMap<EntryKey, Entry>>,
    invocations: RefCell<HashMap<ComputationId, usize>>,
    validated: RefCell<HashSet<ComputationId>>,
}

/// Memoizes metric computations for a single audit run.
///
/// Cloning the cache yields another handle to the same memo table.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use audit_pipeline::{Artifacts, ComputationRegistry, ComputedArtifacts};
/// use audit_pipeline::computations::{TimeToInteractive, TraceOfTab};
///
/// let cache = ComputedArtifacts::new(
///     ComputationRegistry::new().with(TraceOfTab).with(TimeToInteractive),
/// );
/// let artifacts = Rc::new(Artifacts::new());
///
/// let result = futures::executor::block_on(cache.get(&"time-to-interactive".into(), &artifacts));
/// assert!(result.is_err()); // no trace for the default pass
/// ```
#[derive(Clone)]
pub struct ComputedArtifacts {
    inner: Rc<CacheInner>,
}

impl ComputedArtifacts {
    /// Creates an empty cache over `registry` with a generated run id.
    pub fn new(registry: ComputationRegistry) -> Self {
        Self::with_run_id(registry, RunLog::next_run_id())
    }

    /// Creates an empty cache whose log events carry `run_id`.
    pub fn with_run_id(registry: ComputationRegistry, run_id: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(CacheInner {
                run_id: run_id.into(),
                registry,
                entries: RefCell::new(HashMap::new()),
                invocations: RefCell::new(HashMap::new()),
                validated: RefCell::new(HashSet::new()),
            }),
        }
    }

    /// The run this cache belongs to.
    pub fn run_id(&self) -> &str {
        &self.inner.run_id
    }

    /// Returns the metric computed by `id` over `artifacts`.
    ///
    /// The first request starts the computation; every later request in this
    /// run, including ones issued while it is still in flight, awaits the same
    /// result. Failures are memoized too and are never retried.
    ///
    /// # Errors
    ///
    /// - unknown computation, when `id` is not registered
    /// - cyclic computation, when the declared dependencies loop
    /// - undeclared dependency, when a computation requests an id it did not
    ///   list in its dependencies
    /// - missing artifact, when a required key is absent
    /// - computation failure, carrying the failing id and its cause
    pub async fn get(
        &self,
        id: &ComputationId,
        artifacts: &Rc<Artifacts>,
    ) -> Result<Rc<MetricValue>, AuditError> {
        self.get_in_chain(id, artifacts, Vec::new()).await
    }

    /// Number of times the computation `id` has actually been invoked.
    pub fn invocation_count(&self, id: &ComputationId) -> usize {
        self.inner
            .invocations
            .borrow()
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    /// Number of memoized (computation, artifacts) entries.
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    /// Returns true if nothing has been requested yet.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    pub(crate) fn log(&self) -> RunLog<'_> {
        RunLog::new(&self.inner.run_id)
    }

    pub(crate) async fn get_in_chain(
        &self,
        id: &ComputationId,
        artifacts: &Rc<Artifacts>,
        chain: Vec<ComputationId>,
    ) -> Result<Rc<MetricValue>, AuditError> {
        if chain.contains(id) {
            let mut path = chain;
            path.push(id.clone());
            return Err(AuditError::cyclic(path));
        }

        let result = self.lookup_or_start(id, artifacts, chain)?;
        result.await
    }

    fn lookup_or_start(
        &self,
        id: &ComputationId,
        artifacts: &Rc<Artifacts>,
        chain: Vec<ComputationId>,
    ) -> Result<MetricFuture, AuditError> {
        let computation = self
            .inner
            .registry
            .get(id)
            .ok_or_else(|| AuditError::unknown_computation(id.clone()))?;
        self.validate(id)?;

        let key = (id.clone(), Rc::as_ptr(artifacts));
        let mut entries = self.inner.entries.borrow_mut();
        if let Some(entry) = entries.get(&key) {
            let state = if entry.result.peek().is_some() {
                "hit"
            } else {
                "in-flight"
            };
            self.log()
                .trace("cache", format_args!("{} for '{}'", state, id));
            return Ok(entry.result.clone());
        }

        self.log()
            .debug("cache", format_args!("miss for '{}', computing", id));
        let result = self.start(id.clone(), computation, Rc::clone(artifacts), chain);
        entries.insert(
            key,
            Entry {
                _artifacts: Rc::clone(artifacts),
                result: result.clone(),
            },
        );
        Ok(result)
    }

    fn start(
        &self,
        id: ComputationId,
        computation: Rc<dyn MetricComputation>,
        artifacts: Rc<Artifacts>,
        mut chain: Vec<ComputationId>,
    ) -> MetricFuture {
        let cache = self.clone();
        let declared = computation.dependencies();
        chain.push(id.clone());

        async move {
            artifacts.require(&computation.required_artifacts())?;
            *cache
                .inner
                .invocations
                .borrow_mut()
                .entry(id)
                .or_insert(0) += 1;

            let ctx = ComputeContext::new(&cache, &artifacts, &chain, &declared);
            let value = computation.compute(&ctx).await?;
            Ok::<_, AuditError>(Rc::new(value))
        }
        .boxed_local()
        .shared()
    }

    /// Walks the declared dependency graph below `id` once per run.
    fn validate(&self, id: &ComputationId) -> Result<(), AuditError> {
        if self.inner.validated.borrow().contains(id) {
            return Ok(());
        }

        let mut done = HashSet::new();
        self.visit(id, &mut Vec::new(), &mut done)?;
        self.inner.validated.borrow_mut().extend(done);
        Ok(())
    }

    fn visit(
        &self,
        id: &ComputationId,
        path: &mut Vec<ComputationId>,
        done: &mut HashSet<ComputationId>,
    ) -> Result<(), AuditError> {
        if let Some(pos) = path.iter().position(|p| p == id) {
            let mut cycle = path[pos..].to_vec();
            cycle.push(id.clone());
            return Err(AuditError::cyclic(cycle));
        }
        if done.contains(id) || self.inner.validated.borrow().contains(id) {
            return Ok(());
        }

        let computation = self
            .inner
            .registry
            .get(id)
            .ok_or_else(|| AuditError::unknown_computation(id.clone()))?;

        path.push(id.clone());
        for dep in computation.dependencies() {
            self.visit(&dep, path, done)?;
        }
        path.pop();
        done.insert(id.clone());
        Ok(())
    }
}

impl fmt::Debug for ComputedArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedArtifacts")
            .field("run_id", &self.inner.run_id)
            .field("registry", &self.inner.registry)
            .field("entries", &self.len())
            .finish()
    }
}
