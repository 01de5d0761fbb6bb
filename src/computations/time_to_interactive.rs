use async_trait::async_trait;

use super::{us_to_ms, TraceOfTab};
use crate::artifacts::{ArtifactKey, DEFAULT_PASS};
use crate::error::{AuditError, ComputationFailure};
use crate::metric::{ComputationId, ComputeContext, MetricComputation, MetricValue};

/// Tasks longer than this block interactivity.
const LONG_TASK_MS: f64 = 50.0;

/// Length of the quiet window that marks the page as interactive.
const QUIET_WINDOW_MS: f64 = 5_000.0;

/// Time to interactive, relative to navigation start.
///
/// The first instant at or after first meaningful paint that is followed by
/// five seconds without a main-thread task longer than 50 ms. Main-thread
/// tasks are complete (`X`) events in the `toplevel` category.
///
/// Result timings: `timeToInteractive` and `firstMeaningfulPaint`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeToInteractive;

impl TimeToInteractive {
    /// Registry identifier.
    pub const ID: &'static str = "time-to-interactive";
}

#[async_trait(?Send)]
impl MetricComputation for TimeToInteractive {
    fn id(&self) -> ComputationId {
        ComputationId::new(Self::ID)
    }

    fn required_artifacts(&self) -> Vec<ArtifactKey> {
        vec![ArtifactKey::traces(DEFAULT_PASS)]
    }

    fn dependencies(&self) -> Vec<ComputationId> {
        vec![ComputationId::new(TraceOfTab::ID)]
    }

    async fn compute(&self, ctx: &ComputeContext<'_>) -> Result<MetricValue, AuditError> {
        let anchors = ctx.request(&ComputationId::new(TraceOfTab::ID)).await?;
        let navigation = anchors.timing("navigationStart").unwrap_or(0.0);
        let fmp = anchors.value_ms;
        let trace_end = anchors.timing("traceEnd").unwrap_or(fmp);

        let mut long_tasks: Vec<(f64, f64)> = ctx
            .artifacts()
            .trace_events(DEFAULT_PASS)?
            .iter()
            .filter(|e| e.ph == "X" && e.has_category("toplevel"))
            .filter_map(|e| {
                let dur = us_to_ms(e.dur?);
                let start = us_to_ms(e.ts) - navigation;
                (dur > LONG_TASK_MS).then_some((start, start + dur))
            })
            .collect();
        long_tasks.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut candidate = fmp;
        for (start, end) in long_tasks {
            if end <= candidate {
                continue;
            }
            if start >= candidate + QUIET_WINDOW_MS {
                break;
            }
            candidate = end;
        }

        if candidate + QUIET_WINDOW_MS > trace_end {
            return Err(ctx.failure(ComputationFailure::new(format!(
                "trace ended at {trace_end} ms, before a {QUIET_WINDOW_MS} ms quiet window after {candidate} ms"
            ))));
        }

        Ok(MetricValue::new(candidate)
            .with_timing("timeToInteractive", candidate)
            .with_timing("firstMeaningfulPaint", fmp))
    }
}
