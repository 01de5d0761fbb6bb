//! Evaluating the PWA load gate against recorded traces.
//!
//! This example shows:
//! 1. A fast trace passing the gate
//! 2. A slow trace failing it with an explanation
//! 3. A broken trace producing an evaluation error instead of a verdict
//! 4. Two gates sharing one time-to-interactive computation
//!
//! Run with: `cargo run --example pwa_gate`

use audit_pipeline::computations::default_registry;
use audit_pipeline::{
    Artifacts, AuditRun, GateConfig, PassArtifacts, PolicyGate, TraceEvent, DEFAULT_PASS,
};
use futures::executor::block_on;

const MS: u64 = 1_000;

fn trace(fmp_ms: u64, long_task: Option<(u64, u64)>) -> Artifacts {
    let mut events = vec![
        TraceEvent::instant("navigationStart", "blink.user_timing", 0),
        TraceEvent::instant("firstMeaningfulPaint", "loading", fmp_ms * MS),
    ];
    if let Some((start, dur)) = long_task {
        events.push(TraceEvent::complete("RunTask", "toplevel", start * MS, dur * MS));
    }
    events.push(TraceEvent::instant("tracingEnd", "misc", 40_000 * MS));
    Artifacts::new().with_pass(DEFAULT_PASS, PassArtifacts::with_trace(events))
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let gate = PolicyGate::load_fast_enough_for_pwa();

    println!("=== PWA Load Gate Example ===\n");

    println!("--- Scenario 1: Fast load ---");
    let run = AuditRun::new(default_registry(), trace(2_000, None));
    match block_on(run.evaluate(&gate)) {
        Ok(result) => println!("passed: {} ({})", result.raw_value, result.display_value),
        Err(e) => println!("could not evaluate: {}", e),
    }

    println!("\n--- Scenario 2: Slow load ---");
    let run = AuditRun::new(default_registry(), trace(3_000, Some((5_000, 9_000))));
    match block_on(run.evaluate(&gate)) {
        Ok(result) => println!(
            "passed: {}\nreason: {}",
            result.raw_value,
            result.debug_string.unwrap_or_default()
        ),
        Err(e) => println!("could not evaluate: {}", e),
    }

    println!("\n--- Scenario 3: Trace without navigation ---");
    let run = AuditRun::new(
        default_registry(),
        Artifacts::new().with_pass(DEFAULT_PASS, PassArtifacts::default()),
    );
    match block_on(run.evaluate(&gate)) {
        Ok(result) => println!("unexpected verdict: {}", result.raw_value),
        Err(e) => println!("could not evaluate (expected): {}", e),
    }

    println!("\n--- Scenario 4: Two gates, one computation ---");
    let strict = PolicyGate::new(
        GateConfig::new("tti-strict", "time-to-interactive", 2_500.0)
            .metric_label("TTI")
            .value_key("timeToInteractive"),
    );
    let run = AuditRun::new(default_registry(), trace(2_000, Some((2_500, 1_000))));
    for outcome in block_on(run.evaluate_all(&[gate.clone(), strict])) {
        match outcome {
            Ok(result) => println!("{}: passed={}", result.name, result.raw_value),
            Err(e) => println!("error: {}", e),
        }
    }
    println!(
        "time-to-interactive computed {} time(s)",
        run.cache().invocation_count(&"time-to-interactive".into())
    );

    if let Ok(result) = block_on(run.evaluate(&gate)) {
        match result.to_json() {
            Ok(json) => println!("\n{}", json),
            Err(e) => println!("could not serialize: {}", e),
        }
    }
}
