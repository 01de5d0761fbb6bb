use async_trait::async_trait;

use super::us_to_ms;
use crate::artifacts::{ArtifactKey, TraceEvent, DEFAULT_PASS};
use crate::error::{AuditError, ComputationFailure};
use crate::metric::{ComputationId, ComputeContext, MetricComputation, MetricValue};

/// Navigation anchors of the default pass.
///
/// The primary value is first meaningful paint relative to navigation start.
/// Timings:
/// - `navigationStart`: absolute navigation start, trace clock, ms
/// - `firstMeaningfulPaint`: relative to navigation start
/// - `traceEnd`: last recorded instant, relative to navigation start
///
/// When the trace has no `firstMeaningfulPaint` mark, `firstContentfulPaint`
/// stands in for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceOfTab;

impl TraceOfTab {
    /// Registry identifier.
    pub const ID: &'static str = "trace-of-tab";
}

fn first_named<'a>(events: &'a [TraceEvent], name: &str, not_before: u64) -> Option<&'a TraceEvent> {
    events
        .iter()
        .filter(|e| e.name == name && e.ts >= not_before)
        .min_by_key(|e| e.ts)
}

#[async_trait(?Send)]
impl MetricComputation for TraceOfTab {
    fn id(&self) -> ComputationId {
        ComputationId::new(Self::ID)
    }

    fn required_artifacts(&self) -> Vec<ArtifactKey> {
        vec![ArtifactKey::traces(DEFAULT_PASS)]
    }

    async fn compute(&self, ctx: &ComputeContext<'_>) -> Result<MetricValue, AuditError> {
        let events = ctx.artifacts().trace_events(DEFAULT_PASS)?;

        let navigation = events
            .iter()
            .filter(|e| e.name == "navigationStart")
            .min_by_key(|e| e.ts)
            .ok_or_else(|| ctx.failure(ComputationFailure::new("no navigationStart event in trace")))?;

        let paint = first_named(events, "firstMeaningfulPaint", navigation.ts)
            .or_else(|| first_named(events, "firstContentfulPaint", navigation.ts))
            .ok_or_else(|| {
                ctx.failure(ComputationFailure::new(
                    "no firstMeaningfulPaint event after navigationStart",
                ))
            })?;

        let mut trace_end = navigation.ts;
        for event in events {
            let end = event.ts.checked_add(event.dur.unwrap_or(0)).ok_or_else(|| {
                ctx.failure(ComputationFailure::new(format!(
                    "'{}' at {} us overflows the trace clock",
                    event.name, event.ts
                )))
            })?;
            trace_end = trace_end.max(end);
        }

        let fmp = us_to_ms(paint.ts - navigation.ts);
        Ok(MetricValue::new(fmp)
            .with_timing("navigationStart", us_to_ms(navigation.ts))
            .with_timing("firstMeaningfulPaint", fmp)
            .with_timing("traceEnd", us_to_ms(trace_end - navigation.ts)))
    }
}
