use std::fmt;

use serde::{Deserialize, Serialize};

use crate::artifacts::ArtifactKey;
use crate::metric::ComputationId;
use crate::result::FormatterTag;

/// How a gate compares the observed metric with its threshold.
///
/// The metric passes when `metric <op> threshold` holds exactly; there is no
/// tolerance at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    /// Pass when the metric is strictly below the threshold
    #[default]
    LessThan,
    /// Pass when the metric is at or below the threshold
    LessOrEqual,
    /// Pass when the metric is strictly above the threshold
    GreaterThan,
    /// Pass when the metric is at or above the threshold
    GreaterOrEqual,
}

impl Comparison {
    /// Applies the comparison.
    pub fn passes(self, metric: f64, threshold: f64) -> bool {
        match self {
            Comparison::LessThan => metric < threshold,
            Comparison::LessOrEqual => metric <= threshold,
            Comparison::GreaterThan => metric > threshold,
            Comparison::GreaterOrEqual => metric >= threshold,
        }
    }

    /// Phrase describing what passing requires, e.g. `under`.
    pub fn phrase(self) -> &'static str {
        match self {
            Comparison::LessThan => "under",
            Comparison::LessOrEqual => "at most",
            Comparison::GreaterThan => "over",
            Comparison::GreaterOrEqual => "at least",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Comparison::LessThan => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::GreaterThan => ">",
            Comparison::GreaterOrEqual => ">=",
        };
        f.write_str(op)
    }
}

/// Everything that distinguishes one policy gate from another.
///
/// Gates are configured, not subclassed: two gates with different configs
/// run the same evaluation algorithm.
///
/// # Examples
///
/// ```
/// use audit_pipeline::{ArtifactKey, Comparison, GateConfig, DEFAULT_PASS};
///
/// let config = GateConfig::new("tti-budget", "time-to-interactive", 7_500.0)
///     .description("Interactive within the budget")
///     .value_key("timeToInteractive")
///     .require(ArtifactKey::traces(DEFAULT_PASS))
///     .require(ArtifactKey::traces(DEFAULT_PASS)); // deduplicated
///
/// assert_eq!(config.required_artifacts.len(), 1);
/// assert_eq!(config.comparison, Comparison::LessThan);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateConfig {
    /// Unique gate name, e.g. `load-fast-enough-for-pwa`
    pub name: String,
    /// Report category
    #[serde(default)]
    pub category: String,
    /// Short description of what passing means
    #[serde(default)]
    pub description: String,
    /// Longer guidance for the report
    #[serde(default)]
    pub help_text: String,
    /// The computation whose primary value is compared
    #[serde(rename = "metricComputationId")]
    pub metric: ComputationId,
    /// The threshold in milliseconds
    pub threshold_ms: f64,
    /// How metric and threshold are compared
    #[serde(default)]
    pub comparison: Comparison,
    /// Key the metric is stored under in the result's extended info
    #[serde(default = "default_value_key")]
    pub value_key: String,
    /// Human name of the metric used in failure explanations
    #[serde(default)]
    pub metric_label: String,
    /// Extra context prefixed to failure explanations, e.g. test conditions
    #[serde(default)]
    pub failure_context: Option<String>,
    /// Sentence appended to failure explanations, e.g. where to look next
    #[serde(default)]
    pub failure_hint: Option<String>,
    /// Formatter tag attached to the extended info
    #[serde(default)]
    pub formatter: FormatterTag,
    /// Artifacts that must be present before the metric is requested
    #[serde(default)]
    pub required_artifacts: Vec<ArtifactKey>,
}

fn default_value_key() -> String {
    "value".to_string()
}

impl GateConfig {
    /// Creates a config comparing `metric` strictly below `threshold_ms`.
    pub fn new(name: impl Into<String>, metric: impl Into<ComputationId>, threshold_ms: f64) -> Self {
        let metric = metric.into();
        Self {
            name: name.into(),
            category: String::new(),
            description: String::new(),
            help_text: String::new(),
            metric_label: metric.to_string(),
            metric,
            threshold_ms,
            comparison: Comparison::default(),
            value_key: default_value_key(),
            failure_context: None,
            failure_hint: None,
            formatter: FormatterTag::default(),
            required_artifacts: Vec::new(),
        }
    }

    /// Parses a config from JSON.
    ///
    /// Field names are camelCase and the metric is `metricComputationId`:
    ///
    /// ```
    /// use audit_pipeline::GateConfig;
    ///
    /// let config = GateConfig::from_json(r#"{
    ///     "name": "tti-budget",
    ///     "metricComputationId": "time-to-interactive",
    ///     "thresholdMs": 10000,
    ///     "requiredArtifacts": [{"artifact": "traces", "pass": "defaultPass"}]
    /// }"#).unwrap();
    ///
    /// assert_eq!(config.threshold_ms, 10000.0);
    /// assert_eq!(config.value_key, "value");
    /// ```
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets the report category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the short description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the help text.
    pub fn help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = help_text.into();
        self
    }

    /// Sets the comparison direction.
    pub fn comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// Sets the extended-info key for the metric.
    pub fn value_key(mut self, key: impl Into<String>) -> Self {
        self.value_key = key.into();
        self
    }

    /// Sets the metric's human name.
    pub fn metric_label(mut self, label: impl Into<String>) -> Self {
        self.metric_label = label.into();
        self
    }

    /// Sets the context sentence prefixed to failure explanations.
    pub fn failure_context(mut self, context: impl Into<String>) -> Self {
        self.failure_context = Some(context.into());
        self
    }

    /// Sets the sentence appended to failure explanations.
    pub fn failure_hint(mut self, hint: impl Into<String>) -> Self {
        self.failure_hint = Some(hint.into());
        self
    }

    /// Sets the formatter tag.
    pub fn formatter(mut self, formatter: FormatterTag) -> Self {
        self.formatter = formatter;
        self
    }

    /// Adds a required artifact, deduplicating identical keys.
    pub fn require(mut self, key: ArtifactKey) -> Self {
        if !self.required_artifacts.contains(&key) {
            self.required_artifacts.push(key);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::DEFAULT_PASS;

    #[test]
    fn strict_less_than_fails_at_the_boundary() {
        assert!(Comparison::LessThan.passes(9_999.0, 10_000.0));
        assert!(!Comparison::LessThan.passes(10_000.0, 10_000.0));
        assert!(Comparison::LessOrEqual.passes(10_000.0, 10_000.0));
        assert!(!Comparison::GreaterThan.passes(10_000.0, 10_000.0));
        assert!(Comparison::GreaterOrEqual.passes(10_000.0, 10_000.0));
    }

    #[test]
    fn nan_metric_never_passes() {
        for cmp in [
            Comparison::LessThan,
            Comparison::LessOrEqual,
            Comparison::GreaterThan,
            Comparison::GreaterOrEqual,
        ] {
            assert!(!cmp.passes(f64::NAN, 10.0), "{cmp} passed NaN");
        }
    }

    #[test]
    fn builder_sets_every_field() {
        let config = GateConfig::new("g", "m", 1.0)
            .category("PWA")
            .description("d")
            .help_text("h")
            .comparison(Comparison::GreaterOrEqual)
            .value_key("k")
            .metric_label("Metric")
            .failure_context("Under test conditions,")
            .failure_hint("See the report.")
            .formatter(FormatterTag::Table)
            .require(ArtifactKey::traces(DEFAULT_PASS))
            .require(ArtifactKey::network_records(DEFAULT_PASS));

        assert_eq!(config.category, "PWA");
        assert_eq!(config.comparison, Comparison::GreaterOrEqual);
        assert_eq!(config.metric, ComputationId::new("m"));
        assert_eq!(config.failure_context.as_deref(), Some("Under test conditions,"));
        assert_eq!(config.failure_hint.as_deref(), Some("See the report."));
        assert_eq!(config.formatter, FormatterTag::Table);
        assert_eq!(config.required_artifacts.len(), 2);
    }

    #[test]
    fn json_config_round_trips() {
        let config = GateConfig::new("g", "time-to-interactive", 10_000.0)
            .comparison(Comparison::LessOrEqual)
            .require(ArtifactKey::traces(DEFAULT_PASS));
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"metricComputationId\":\"time-to-interactive\""));
        assert_eq!(GateConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn metric_label_defaults_to_metric_id() {
        let config = GateConfig::new("g", "speed-index", 1.0);
        assert_eq!(config.metric_label, "speed-index");
    }
}
