use super::EntityKind;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Pipeline phase a progress event was emitted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPhase {
    Validation,
    Storing,
    Creating,
}

impl LoadPhase {
    /// Sub-range of the kind-level 0-100 scale occupied by this phase.
    ///
    /// Validation is cheap relative to the database round trips, so it
    /// gets a narrow slice; the final creating event always lands on 100.
    fn range(&self) -> (u64, u64) {
        match self {
            LoadPhase::Validation => (0, 10),
            LoadPhase::Storing => (10, 50),
            LoadPhase::Creating => (60, 40),
        }
    }
}

/// A single progress notification
///
/// Emitted zero or more times per invocation via the caller-supplied sink;
/// never retained by the engine. Percentages within one invocation are
/// non-decreasing and the final emitted value is 100.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    /// Phase the pipeline is in
    pub phase: LoadPhase,
    /// Entity kind being processed
    pub kind: EntityKind,
    /// Records processed so far within this phase
    pub current: usize,
    /// Total records for this phase
    pub total: usize,
    /// Derived position on the unified 0-100 scale
    pub percentage: u8,
    /// Time elapsed since the invocation started, in milliseconds
    pub elapsed_ms: u64,
    /// Estimated remaining time, when a meaningful estimate exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_remaining_ms: Option<u64>,
    /// Per-type or per-batch detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Caller-supplied progress sink, threaded explicitly through the call
/// chain (never ambient state)
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Emits progress for one entity kind, mapping phase-local counters onto
/// the kind-level 0-100 scale
#[derive(Clone)]
pub struct ProgressReporter {
    sink: Option<ProgressSink>,
    kind: EntityKind,
    started: Instant,
}

impl ProgressReporter {
    pub fn new(sink: Option<ProgressSink>, kind: EntityKind, started: Instant) -> Self {
        Self {
            sink,
            kind,
            started,
        }
    }

    /// A reporter that drops every event
    pub fn disabled(kind: EntityKind) -> Self {
        Self::new(None, kind, Instant::now())
    }

    /// Emit one event; no-op when no sink was supplied
    pub fn emit(&self, phase: LoadPhase, current: usize, total: usize, detail: Option<String>) {
        let sink = match &self.sink {
            Some(sink) => sink,
            None => return,
        };

        let percentage = phase_percentage(phase, current, total);
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let estimated_remaining_ms = if percentage > 0 && percentage < 100 {
            Some(elapsed_ms * u64::from(100 - percentage) / u64::from(percentage))
        } else {
            None
        };

        sink(ProgressEvent {
            phase,
            kind: self.kind,
            current,
            total,
            percentage,
            elapsed_ms,
            estimated_remaining_ms,
            detail,
        });
    }
}

/// Map a phase-local counter to the kind-level percentage
fn phase_percentage(phase: LoadPhase, current: usize, total: usize) -> u8 {
    let (offset, span) = phase.range();
    if total == 0 {
        return (offset + span).min(100) as u8;
    }
    let current = current.min(total) as u64;
    (offset + current * span / total as u64).min(100) as u8
}

/// Wrap a sink so that percentages are compressed into `offset..offset+span`
/// of the unified scale. Used by the orchestrator to map vertex progress
/// into 0-50 and edge progress into 50-100 when both kinds are present.
pub fn scaled_sink(sink: ProgressSink, offset: u8, span: u8) -> ProgressSink {
    Arc::new(move |mut event: ProgressEvent| {
        let scaled =
            u64::from(offset) + u64::from(event.percentage) * u64::from(span) / 100;
        event.percentage = scaled.min(100) as u8;
        sink(event);
    })
}
