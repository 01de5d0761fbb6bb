use std::rc::Rc;

use crate::artifacts::Artifacts;
use crate::cache::ComputedArtifacts;
use crate::error::AuditError;
use crate::metric::MetricValue;
use crate::policy::GateConfig;
use crate::result::{format_ms, AuditResult, ExtendedInfo};

/// A configured threshold check over one metric.
///
/// `PolicyGate` holds nothing but its [`GateConfig`]; every gate shares the
/// same evaluation algorithm and any number of evaluations may run against
/// different artifacts at once.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use audit_pipeline::{
///     Artifacts, ComputationRegistry, ComputedArtifacts, PassArtifacts, PolicyGate, DEFAULT_PASS,
/// };
/// use audit_pipeline::computations::{TimeToInteractive, TraceOfTab};
///
/// let cache = ComputedArtifacts::new(
///     ComputationRegistry::new().with(TraceOfTab).with(TimeToInteractive),
/// );
/// let gate = PolicyGate::load_fast_enough_for_pwa();
///
/// // No trace recorded: this is an evaluation error, not a failing verdict.
/// let artifacts = Rc::new(Artifacts::new());
/// let outcome = futures::executor::block_on(gate.evaluate(&cache, &artifacts));
/// assert!(outcome.is_err());
///
/// // An empty trace cannot be parsed either.
/// let artifacts = Rc::new(Artifacts::new().with_pass(DEFAULT_PASS, PassArtifacts::default()));
/// let outcome = futures::executor::block_on(gate.evaluate(&cache, &artifacts));
/// assert!(outcome.unwrap_err().is_computation_failure());
/// ```
#[derive(Debug, Clone)]
pub struct PolicyGate {
    config: GateConfig,
}

impl PolicyGate {
    /// Creates a gate from its configuration.
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    /// The gate's configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// The gate's name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Evaluates the gate against one artifacts set.
    ///
    /// Required artifacts are checked first, then the metric is requested
    /// from `cache` and compared with the threshold.
    ///
    /// # Errors
    ///
    /// Any failure to obtain the metric is returned unchanged. A metric that
    /// misses the threshold is `Ok` with `raw_value == false`.
    pub async fn evaluate(
        &self,
        cache: &ComputedArtifacts,
        artifacts: &Rc<Artifacts>,
    ) -> Result<AuditResult, AuditError> {
        artifacts.require(&self.config.required_artifacts)?;

        let metric = cache.get(&self.config.metric, artifacts).await?;
        let result = self.judge(&metric);

        cache.log().debug(
            "gate",
            format_args!(
                "{}: {} {} {} -> {}",
                self.config.name,
                metric.value_ms,
                self.config.comparison,
                self.config.threshold_ms,
                if result.raw_value { "pass" } else { "fail" }
            ),
        );
        Ok(result)
    }

    /// Applies the threshold to an already computed metric.
    pub fn judge(&self, metric: &MetricValue) -> AuditResult {
        let config = &self.config;
        let observed = metric.value_ms;
        let passed = config.comparison.passes(observed, config.threshold_ms);
        let display_value = format_ms(observed);

        let mut value = serde_json::Map::new();
        value.insert(config.value_key.clone(), serde_json::json!(observed));

        let debug_string = if passed {
            None
        } else {
            Some(self.explain(&display_value))
        };

        AuditResult {
            name: config.name.clone(),
            category: config.category.clone(),
            description: config.description.clone(),
            help_text: config.help_text.clone(),
            raw_value: passed,
            score: passed,
            display_value,
            debug_string,
            extended_info: ExtendedInfo {
                formatter: config.formatter,
                value,
            },
        }
    }

    fn explain(&self, display_value: &str) -> String {
        let config = &self.config;
        let label = if config.metric_label.is_empty() {
            config.metric.as_str()
        } else {
            config.metric_label.as_str()
        };
        let sentence = format!(
            "the {} was at {}, which is not {} {}.",
            label,
            display_value,
            config.comparison.phrase(),
            format_ms(config.threshold_ms),
        );

        let explanation = match &config.failure_context {
            Some(context) => format!("{} {}", context, sentence),
            None => capitalize(&sentence),
        };
        match &config.failure_hint {
            Some(hint) => format!("{} {}", explanation, hint),
            None => explanation,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Comparison;

    fn gate(threshold: f64) -> PolicyGate {
        PolicyGate::new(
            GateConfig::new("budget", "time-to-interactive", threshold)
                .metric_label("Time To Interactive")
                .value_key("timeToInteractive"),
        )
    }

    #[test]
    fn passing_metric_has_no_debug_string() {
        let result = gate(10_000.0).judge(&MetricValue::new(5_000.0));
        assert!(result.raw_value);
        assert!(result.score);
        assert_eq!(result.debug_string, None);
        assert_eq!(result.display_value, "5,000 ms");
        assert_eq!(
            result.extended_info.number("timeToInteractive"),
            Some(5_000.0)
        );
    }

    #[test]
    fn failing_metric_explains_value_and_threshold() {
        let result = gate(10_000.0).judge(&MetricValue::new(15_000.0));
        assert!(!result.raw_value);
        let debug = result.debug_string.expect("failure is explained");
        assert_eq!(
            debug,
            "The Time To Interactive was at 15,000 ms, which is not under 10,000 ms."
        );
        assert_eq!(
            result.extended_info.number("timeToInteractive"),
            Some(15_000.0)
        );
    }

    #[test]
    fn exactly_at_threshold_fails_strict_gate() {
        let result = gate(10_000.0).judge(&MetricValue::new(10_000.0));
        assert!(!result.raw_value);
    }

    #[test]
    fn comparison_direction_is_configurable() {
        let gate = PolicyGate::new(
            GateConfig::new("min-score", "score", 90.0).comparison(Comparison::GreaterOrEqual),
        );
        assert!(gate.judge(&MetricValue::new(90.0)).raw_value);
        let failed = gate.judge(&MetricValue::new(89.0));
        assert!(!failed.raw_value);
        assert!(failed
            .debug_string
            .unwrap()
            .contains("which is not at least 90 ms"));
    }

    #[test]
    fn failure_context_prefixes_the_explanation() {
        let gate = PolicyGate::new(
            GateConfig::new("g", "time-to-interactive", 10.0)
                .metric_label("TTI")
                .failure_context("Under mobile conditions,"),
        );
        let debug = gate.judge(&MetricValue::new(20.0)).debug_string.unwrap();
        assert!(debug.starts_with("Under mobile conditions, the TTI was at 20 ms"));
    }

    #[test]
    fn failure_hint_follows_the_explanation() {
        let gate = PolicyGate::new(
            GateConfig::new("g", "time-to-interactive", 10.0)
                .metric_label("TTI")
                .failure_hint("See the trace."),
        );
        let failing = gate.judge(&MetricValue::new(20.0));
        assert_eq!(
            failing.debug_string.as_deref(),
            Some("The TTI was at 20 ms, which is not under 10 ms. See the trace.")
        );
        assert_eq!(gate.judge(&MetricValue::new(5.0)).debug_string, None);
    }

    #[test]
    fn empty_label_falls_back_to_metric_id() {
        let mut config = GateConfig::new("g", "speed-index", 10.0);
        config.metric_label = String::new();
        let debug = PolicyGate::new(config)
            .judge(&MetricValue::new(20.0))
            .debug_string
            .unwrap();
        assert!(debug.starts_with("The speed-index was at"));
    }
}
