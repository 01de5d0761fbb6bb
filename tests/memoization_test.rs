mod common;

use std::rc::Rc;

use audit_pipeline::{ComputationRegistry, ComputedArtifacts, GateConfig, PolicyGate};
use common::{calls, default_artifacts, StubTti};
use futures::channel::oneshot;
use futures::executor::block_on;

#[test]
fn two_gates_share_one_computation() {
    let calls = calls();
    let cache = ComputedArtifacts::new(
        ComputationRegistry::new().with(StubTti::returning(7000.0, &calls)),
    );
    let artifacts = default_artifacts();
    let pwa = PolicyGate::load_fast_enough_for_pwa();
    let strict = PolicyGate::new(
        GateConfig::new("tti-strict", "time-to-interactive", 5000.0)
            .value_key("timeToInteractive"),
    );

    let a = block_on(pwa.evaluate(&cache, &artifacts)).unwrap();
    let b = block_on(strict.evaluate(&cache, &artifacts)).unwrap();

    assert_eq!(calls.get(), 1);
    assert!(a.raw_value);
    assert!(!b.raw_value);
    assert_eq!(a.extended_info.value, b.extended_info.value);
}

#[test]
fn concurrent_requests_join_the_in_flight_computation() {
    let calls = calls();
    let (release, hold) = oneshot::channel();
    let cache = ComputedArtifacts::new(
        ComputationRegistry::new().with(StubTti::returning(5000.0, &calls).held_until(hold)),
    );
    let artifacts = default_artifacts();
    let id = "time-to-interactive".into();

    let observed = Rc::clone(&calls);
    let (first, second, started) = block_on(async {
        futures::join!(
            cache.get(&id, &artifacts),
            cache.get(&id, &artifacts),
            async move {
                // Both requests are pending on the same computation by now.
                let started = observed.get();
                release.send(()).expect("computation is waiting");
                started
            }
        )
    });

    assert_eq!(started, 1);
    assert_eq!(calls.get(), 1);
    assert!(Rc::ptr_eq(&first.unwrap(), &second.unwrap()));
    assert_eq!(cache.invocation_count(&id), 1);
}

#[test]
fn concurrent_gates_observe_the_same_metric() {
    let calls = calls();
    let (release, hold) = oneshot::channel();
    let cache = ComputedArtifacts::new(
        ComputationRegistry::new().with(StubTti::returning(15000.0, &calls).held_until(hold)),
    );
    let artifacts = default_artifacts();
    let pwa = PolicyGate::load_fast_enough_for_pwa();
    let lenient = PolicyGate::new(
        GateConfig::new("tti-lenient", "time-to-interactive", 20000.0)
            .value_key("timeToInteractive"),
    );

    let (a, b, ()) = block_on(async {
        futures::join!(
            pwa.evaluate(&cache, &artifacts),
            lenient.evaluate(&cache, &artifacts),
            async move {
                release.send(()).expect("computation is waiting");
            }
        )
    });

    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(calls.get(), 1);
    assert!(!a.raw_value);
    assert!(b.raw_value);
    assert_eq!(
        a.extended_info.number("timeToInteractive"),
        b.extended_info.number("timeToInteractive")
    );
}

#[test]
fn memoized_failure_is_not_retried() {
    let calls = calls();
    let cache = ComputedArtifacts::new(
        ComputationRegistry::new().with(StubTti::failing("trace truncated", &calls)),
    );
    let artifacts = default_artifacts();
    let gate = PolicyGate::load_fast_enough_for_pwa();

    let first = block_on(gate.evaluate(&cache, &artifacts)).unwrap_err();
    let second = block_on(gate.evaluate(&cache, &artifacts)).unwrap_err();

    assert_eq!(first.kind(), second.kind());
    assert_eq!(calls.get(), 1);
}

#[test]
fn separate_runs_do_not_share_results() {
    let calls = calls();
    let registry = ComputationRegistry::new().with(StubTti::returning(5000.0, &calls));
    let artifacts = default_artifacts();
    let gate = PolicyGate::load_fast_enough_for_pwa();

    for _ in 0..3 {
        let cache = ComputedArtifacts::new(registry.clone());
        block_on(gate.evaluate(&cache, &artifacts)).unwrap();
    }

    assert_eq!(calls.get(), 3);
}
