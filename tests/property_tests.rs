//! Property tests for the threshold gate.
//!
//! These check that verdicts follow the configured comparison exactly and
//! that evaluation is repeatable within a run.

mod common;

use audit_pipeline::{
    Comparison, ComputationRegistry, ComputedArtifacts, GateConfig, MetricValue, PolicyGate,
};
use common::{calls, default_artifacts, StubTti};
use futures::executor::block_on;
use proptest::prelude::*;

fn arb_comparison() -> impl Strategy<Value = Comparison> {
    prop_oneof![
        Just(Comparison::LessThan),
        Just(Comparison::LessOrEqual),
        Just(Comparison::GreaterThan),
        Just(Comparison::GreaterOrEqual),
    ]
}

proptest! {
    /// Property: the verdict is exactly `metric < threshold` for the PWA gate,
    /// with no tolerance at the boundary.
    #[test]
    fn proptest_strict_threshold_is_exact(metric in 0.0f64..30_000.0) {
        let gate = PolicyGate::load_fast_enough_for_pwa();
        let result = gate.judge(&MetricValue::new(metric));

        prop_assert_eq!(result.raw_value, metric < 10_000.0);
        prop_assert_eq!(result.debug_string.is_some(), !result.raw_value);
        prop_assert_eq!(result.extended_info.number("timeToInteractive"), Some(metric));
    }

    /// Property: every comparison direction is applied literally.
    #[test]
    fn proptest_configured_comparison_is_applied(
        metric in -1_000i32..1_000,
        threshold in -1_000i32..1_000,
        comparison in arb_comparison()
    ) {
        let (m, t) = (f64::from(metric), f64::from(threshold));
        let gate = PolicyGate::new(GateConfig::new("g", "m", t).comparison(comparison));
        let expected = match comparison {
            Comparison::LessThan => m < t,
            Comparison::LessOrEqual => m <= t,
            Comparison::GreaterThan => m > t,
            Comparison::GreaterOrEqual => m >= t,
        };

        prop_assert_eq!(gate.judge(&MetricValue::new(m)).raw_value, expected);
    }

    /// Property: within one run the same gate and artifacts serialize to the
    /// same bytes, and the metric is computed once.
    #[test]
    fn proptest_evaluation_is_idempotent(metric in 0u32..50_000, repeats in 2usize..5) {
        let calls = calls();
        let cache = ComputedArtifacts::new(
            ComputationRegistry::new().with(StubTti::returning(f64::from(metric), &calls)),
        );
        let artifacts = default_artifacts();
        let gate = PolicyGate::load_fast_enough_for_pwa();

        let first = block_on(gate.evaluate(&cache, &artifacts)).unwrap().to_json().unwrap();
        for _ in 1..repeats {
            let again = block_on(gate.evaluate(&cache, &artifacts)).unwrap().to_json().unwrap();
            prop_assert_eq!(&again, &first);
        }
        prop_assert_eq!(calls.get(), 1);
    }
}
