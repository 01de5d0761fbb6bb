//! Built-in gate configurations.

use crate::artifacts::{ArtifactKey, DEFAULT_PASS};
use crate::computations::TimeToInteractive;
use crate::gate::PolicyGate;
use crate::policy::{Comparison, GateConfig};
use crate::result::FormatterTag;

/// Maximum time to interactive considered "fast" by the PWA baseline checklist.
pub const MAXIMUM_TTI_MS: f64 = 10_000.0;

/// Page load is fast enough on 3G.
///
/// Passes when time to interactive is strictly under [`MAXIMUM_TTI_MS`].
pub fn load_fast_enough_for_pwa() -> GateConfig {
    GateConfig::new(
        "load-fast-enough-for-pwa",
        TimeToInteractive::ID,
        MAXIMUM_TTI_MS,
    )
    .category("PWA")
    .description("Page load is fast enough on 3G")
    .help_text(
        "Satisfied if the _Time To Interactive_ duration is shorter than _10 seconds_, as \
         defined by the [PWA Baseline Checklist](https://developers.google.com/web/progressive-web-apps/checklist).",
    )
    .comparison(Comparison::LessThan)
    .metric_label("TTI")
    .failure_context("Under mobile conditions,")
    .failure_hint("More details in \"Performance\" section.")
    .value_key("timeToInteractive")
    .formatter(FormatterTag::Null)
    .require(ArtifactKey::traces(DEFAULT_PASS))
}

impl PolicyGate {
    /// The built-in `load-fast-enough-for-pwa` gate.
    pub fn load_fast_enough_for_pwa() -> Self {
        PolicyGate::new(load_fast_enough_for_pwa())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::MetricValue;

    #[test]
    fn pwa_gate_is_configured_from_the_checklist() {
        let config = load_fast_enough_for_pwa();
        assert_eq!(config.name, "load-fast-enough-for-pwa");
        assert_eq!(config.category, "PWA");
        assert_eq!(config.threshold_ms, 10_000.0);
        assert_eq!(config.metric.as_str(), "time-to-interactive");
        assert_eq!(
            config.required_artifacts,
            vec![ArtifactKey::traces(DEFAULT_PASS)]
        );
    }

    #[test]
    fn pwa_gate_failure_mentions_mobile_conditions() {
        let result = PolicyGate::load_fast_enough_for_pwa().judge(&MetricValue::new(15_000.0));
        assert_eq!(
            result.debug_string.as_deref(),
            Some(
                "Under mobile conditions, the TTI was at 15,000 ms, which is not under 10,000 ms. \
                 More details in \"Performance\" section."
            )
        );
    }
}
