//! Raw per-pass inputs handed to an audit run.
//!
//! Artifacts are owned by the caller and never mutated by the pipeline. A run
//! shares them as `Rc<Artifacts>` so the computed-artifact cache can tell one
//! artifacts set from another.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// The well-known pass identifier used when a single pass suffices.
pub const DEFAULT_PASS: &str = "defaultPass";

/// A single timestamped record from a recorded trace.
///
/// Field names follow the Chrome trace event format. Timestamps and
/// durations are in microseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Event name, e.g. `navigationStart`
    pub name: String,
    /// Comma separated categories
    #[serde(default)]
    pub cat: String,
    /// Phase, e.g. `X` for complete events or `R` for marks
    #[serde(default)]
    pub ph: String,
    /// Timestamp in microseconds
    pub ts: u64,
    /// Duration in microseconds for complete events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dur: Option<u64>,
    /// Process id
    #[serde(default)]
    pub pid: u64,
    /// Thread id
    #[serde(default)]
    pub tid: u64,
    /// Free-form event arguments
    #[serde(default)]
    pub args: serde_json::Value,
}

impl TraceEvent {
    /// Creates an instant event with no duration.
    pub fn instant(name: impl Into<String>, cat: impl Into<String>, ts: u64) -> Self {
        Self {
            name: name.into(),
            cat: cat.into(),
            ph: "R".to_string(),
            ts,
            dur: None,
            pid: 0,
            tid: 0,
            args: serde_json::Value::Null,
        }
    }

    /// Creates a complete (`X`) event spanning `dur` microseconds.
    pub fn complete(name: impl Into<String>, cat: impl Into<String>, ts: u64, dur: u64) -> Self {
        Self {
            ph: "X".to_string(),
            dur: Some(dur),
            ..Self::instant(name, cat, ts)
        }
    }

    /// Returns true if `cat` contains the given category.
    pub fn has_category(&self, category: &str) -> bool {
        self.cat.split(',').any(|c| c.trim() == category)
    }
}

/// A single network request observed during a pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRecord {
    /// Request URL
    pub url: String,
    /// Start of the request in seconds
    pub start_time: f64,
    /// End of the response in seconds
    pub end_time: f64,
    /// HTTP status code
    #[serde(default)]
    pub status_code: u16,
    /// Resource type, e.g. `Document` or `Script`
    #[serde(default)]
    pub resource_type: Option<String>,
    /// Bytes transferred over the wire
    #[serde(default)]
    pub transfer_size: u64,
}

/// Everything recorded during one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassArtifacts {
    /// Ordered trace events
    pub trace_events: Vec<TraceEvent>,
    /// Ordered network records, when the pass collected them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_records: Option<Vec<NetworkRecord>>,
}

impl PassArtifacts {
    /// Creates a pass holding only trace events.
    pub fn with_trace(trace_events: Vec<TraceEvent>) -> Self {
        Self {
            trace_events,
            network_records: None,
        }
    }

    /// Attaches network records to this pass.
    pub fn network_records(mut self, records: Vec<NetworkRecord>) -> Self {
        self.network_records = Some(records);
        self
    }
}

/// Names one piece of data a computation or gate needs.
///
/// Rendered the way it is addressed in the artifacts map:
/// `traces[defaultPass]` or `networkRecords[defaultPass]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "artifact", content = "pass", rename_all = "camelCase")]
pub enum ArtifactKey {
    /// Trace events of a pass
    Traces(String),
    /// Network records of a pass
    NetworkRecords(String),
}

impl ArtifactKey {
    /// Key for the trace events of `pass`.
    pub fn traces(pass: impl Into<String>) -> Self {
        ArtifactKey::Traces(pass.into())
    }

    /// Key for the network records of `pass`.
    pub fn network_records(pass: impl Into<String>) -> Self {
        ArtifactKey::NetworkRecords(pass.into())
    }

    /// The pass identifier this key points into.
    pub fn pass(&self) -> &str {
        match self {
            ArtifactKey::Traces(pass) | ArtifactKey::NetworkRecords(pass) => pass,
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKey::Traces(pass) => write!(f, "traces[{}]", pass),
            ArtifactKey::NetworkRecords(pass) => write!(f, "networkRecords[{}]", pass),
        }
    }
}

/// Raw inputs for one audit run, keyed by pass identifier.
///
/// # Examples
///
/// ```
/// use audit_pipeline::{Artifacts, ArtifactKey, PassArtifacts, TraceEvent, DEFAULT_PASS};
///
/// let artifacts = Artifacts::new().with_pass(
///     DEFAULT_PASS,
///     PassArtifacts::with_trace(vec![TraceEvent::instant("navigationStart", "blink.user_timing", 0)]),
/// );
///
/// assert_eq!(artifacts.trace_events(DEFAULT_PASS).unwrap().len(), 1);
/// assert!(artifacts.contains(&ArtifactKey::traces(DEFAULT_PASS)));
/// assert!(!artifacts.contains(&ArtifactKey::network_records(DEFAULT_PASS)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artifacts {
    passes: BTreeMap<String, PassArtifacts>,
}

impl Artifacts {
    /// Creates an empty artifacts set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the data recorded for `pass`.
    pub fn with_pass(mut self, pass: impl Into<String>, data: PassArtifacts) -> Self {
        self.passes.insert(pass.into(), data);
        self
    }

    /// Parses artifacts from their JSON form (`{ "<pass>": { "traceEvents": [...] } }`).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns the data recorded for `pass`, if any.
    pub fn pass(&self, pass: &str) -> Option<&PassArtifacts> {
        self.passes.get(pass)
    }

    /// Iterates over the recorded pass identifiers in order.
    pub fn pass_ids(&self) -> impl Iterator<Item = &str> {
        self.passes.keys().map(String::as_str)
    }

    /// Returns true if the artifact named by `key` is present.
    pub fn contains(&self, key: &ArtifactKey) -> bool {
        match key {
            ArtifactKey::Traces(pass) => self.passes.contains_key(pass),
            ArtifactKey::NetworkRecords(pass) => self
                .passes
                .get(pass)
                .is_some_and(|p| p.network_records.is_some()),
        }
    }

    /// Returns the first key in `keys` that is absent, as an error.
    pub fn require(&self, keys: &[ArtifactKey]) -> Result<(), AuditError> {
        match keys.iter().find(|key| !self.contains(key)) {
            Some(key) => Err(AuditError::missing_artifact(key.clone())),
            None => Ok(()),
        }
    }

    /// Trace events for `pass`.
    ///
    /// # Errors
    ///
    /// Returns a missing-artifact error naming `traces[pass]`.
    pub fn trace_events(&self, pass: &str) -> Result<&[TraceEvent], AuditError> {
        self.passes
            .get(pass)
            .map(|p| p.trace_events.as_slice())
            .ok_or_else(|| AuditError::missing_artifact(ArtifactKey::traces(pass)))
    }

    /// Network records for `pass`.
    ///
    /// # Errors
    ///
    /// Returns a missing-artifact error naming `networkRecords[pass]`.
    pub fn network_records(&self, pass: &str) -> Result<&[NetworkRecord], AuditError> {
        self.passes
            .get(pass)
            .and_then(|p| p.network_records.as_deref())
            .ok_or_else(|| AuditError::missing_artifact(ArtifactKey::network_records(pass)))
    }
}
