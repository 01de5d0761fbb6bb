use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;

use crate::artifacts::ArtifactKey;
use crate::metric::ComputationId;

/// Errors that prevent an audit from being evaluated.
///
/// An `AuditError` means "could not determine". A metric that was computed
/// and then missed its threshold is not an error; it is an
/// [`AuditResult`](crate::AuditResult) with `raw_value == false`.
///
/// The error is cheap to clone so that a memoized failure can be handed to
/// every gate that requested the same computation.
///
/// # Examples
///
/// ```
/// use audit_pipeline::{ArtifactKey, AuditError, ErrorKind, DEFAULT_PASS};
///
/// let err = AuditError::missing_artifact(ArtifactKey::traces(DEFAULT_PASS));
/// assert!(matches!(err.kind(), ErrorKind::MissingArtifact { .. }));
/// assert_eq!(err.to_string(), "missing artifact: traces[defaultPass] is not present");
/// ```
#[derive(Debug, Clone)]
pub struct AuditError {
    kind: ErrorKind,
    message: String,
    source: Option<Rc<dyn StdError + 'static>>,
}

impl AuditError {
    /// Creates a new error with the specified kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// A required pass or key is absent from the artifacts.
    pub fn missing_artifact(key: ArtifactKey) -> Self {
        let message = format!("{key} is not present");
        Self::new(ErrorKind::MissingArtifact { key }, message)
    }

    /// A metric computation failed for reasons internal to it.
    ///
    /// The cause is kept and returned from [`StdError::source`].
    pub fn computation(id: ComputationId, cause: impl StdError + 'static) -> Self {
        let message = cause.to_string();
        Self {
            kind: ErrorKind::Computation { id },
            message,
            source: Some(Rc::new(cause)),
        }
    }

    /// The dependency chain between computations loops back on itself.
    pub fn cyclic(path: Vec<ComputationId>) -> Self {
        let rendered = path
            .iter()
            .map(ComputationId::as_str)
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::new(
            ErrorKind::CyclicComputation { path },
            format!("dependency cycle {rendered}"),
        )
    }

    /// No computation is registered under the requested identifier.
    pub fn unknown_computation(id: ComputationId) -> Self {
        let message = format!("no computation registered as '{id}'");
        Self::new(ErrorKind::UnknownComputation { id }, message)
    }

    /// A computation requested another one it did not declare.
    pub fn undeclared_dependency(from: ComputationId, to: ComputationId) -> Self {
        let message = format!("'{from}' requested '{to}' without declaring it as a dependency");
        Self::new(ErrorKind::UndeclaredDependency { from, to }, message)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when this error was produced by a computation failing internally.
    pub fn is_computation_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::Computation { .. })
    }
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for AuditError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref()
    }
}

/// The kind of failure that stopped an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A computation's required artifact is absent.
    MissingArtifact {
        /// The missing key, e.g. `traces[defaultPass]`
        key: ArtifactKey,
    },
    /// The underlying metric computation failed.
    Computation {
        /// The computation that failed
        id: ComputationId,
    },
    /// Computations depend on each other in a loop.
    CyclicComputation {
        /// The request chain, ending with the repeated identifier
        path: Vec<ComputationId>,
    },
    /// A computation requested another one missing from its declared
    /// dependencies.
    UndeclaredDependency {
        /// The requesting computation
        from: ComputationId,
        /// The computation it asked for
        to: ComputationId,
    },
    /// A gate or computation asked for an identifier nobody registered.
    UnknownComputation {
        /// The identifier that was requested
        id: ComputationId,
    },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MissingArtifact { .. } => write!(f, "missing artifact"),
            ErrorKind::Computation { id } => write!(f, "computation '{}' failed", id),
            ErrorKind::CyclicComputation { .. } => write!(f, "cyclic computation"),
            ErrorKind::UndeclaredDependency { .. } => write!(f, "undeclared dependency"),
            ErrorKind::UnknownComputation { .. } => write!(f, "unknown computation"),
        }
    }
}

/// A plain failure raised from inside a metric computation.
///
/// Computations wrap it with [`AuditError::computation`] so the failing
/// identifier travels with the cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputationFailure {
    message: String,
}

impl ComputationFailure {
    /// Creates a failure with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ComputationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ComputationFailure {}
