use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Opaque identifier for timeline intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalId(Uuid);

impl IntervalId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user-defined time range with an associated filter.
///
/// Intervals may overlap freely; `layer` records insertion order and is the
/// deterministic tie-break for composition, never an exclusion rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineInterval {
    pub id: IntervalId,
    pub filter_id: String,
    pub filter_label: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub layer: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl TimelineInterval {
    /// Whether the interval covers playback instant `t` (inclusive ends).
    pub fn contains(&self, t: f64) -> bool {
        self.start_seconds <= t && t <= self.end_seconds
    }

    /// CSS-style effect fragment for this interval's filter.
    ///
    /// A `{"effect": "..."}` parameter overrides the built-in mapping; a
    /// `{"radius_px": n}` parameter adjusts the blur radius. Unknown filter
    /// ids yield `None` and are skipped during composition.
    pub fn effect_fragment(&self) -> Option<String> {
        if let Some(effect) = self
            .parameters
            .as_ref()
            .and_then(|p| p.get("effect"))
            .and_then(Value::as_str)
        {
            return Some(effect.to_string());
        }

        match self.filter_id.as_str() {
            "grayscale" => Some("grayscale(1)".to_string()),
            "sepia" => Some("sepia(1)".to_string()),
            "blur" => {
                let radius = self
                    .parameters
                    .as_ref()
                    .and_then(|p| p.get("radius_px"))
                    .and_then(Value::as_f64)
                    .unwrap_or(12.0);
                Some(format!("blur({radius}px)"))
            }
            _ => None,
        }
    }
}

/// Interval store with deterministic active-filter resolution.
///
/// All mutating operations clamp or no-op instead of failing: playback time
/// is a continuously moving external input and an intermediate drag state
/// must never stall the editing UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineEngine {
    duration_seconds: f64,
    intervals: Vec<TimelineInterval>,
    next_layer: u32,
}

impl TimelineEngine {
    /// Create an engine for a source of the given duration.
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            duration_seconds: sanitize(duration_seconds),
            intervals: Vec::new(),
            next_layer: 0,
        }
    }

    /// Rebuild an engine from persisted intervals.
    pub fn restore(duration_seconds: f64, intervals: Vec<TimelineInterval>) -> Self {
        let next_layer = intervals.iter().map(|i| i.layer + 1).max().unwrap_or(0);
        let mut engine = Self {
            duration_seconds: sanitize(duration_seconds),
            intervals,
            next_layer,
        };
        // Re-clamp in case the persisted ranges outlive a shorter source.
        for index in 0..engine.intervals.len() {
            let (start, end) = engine.clamp_range(
                engine.intervals[index].start_seconds,
                engine.intervals[index].end_seconds,
            );
            engine.intervals[index].start_seconds = start;
            engine.intervals[index].end_seconds = end;
        }
        engine
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// Update the source duration, re-clamping existing intervals.
    pub fn set_duration(&mut self, duration_seconds: f64) {
        self.duration_seconds = sanitize(duration_seconds);
        for index in 0..self.intervals.len() {
            let (start, end) = self.clamp_range(
                self.intervals[index].start_seconds,
                self.intervals[index].end_seconds,
            );
            self.intervals[index].start_seconds = start;
            self.intervals[index].end_seconds = end;
        }
    }

    /// Add an interval, clamping the range into `[0, duration]` and swapping
    /// reversed endpoints. Assigns the next unused layer.
    pub fn add(&mut self, filter_id: impl Into<String>, filter_label: impl Into<String>, start: f64, end: f64) -> IntervalId {
        let (start_seconds, end_seconds) = self.clamp_range(start, end);
        let interval = TimelineInterval {
            id: IntervalId::new(),
            filter_id: filter_id.into(),
            filter_label: filter_label.into(),
            start_seconds,
            end_seconds,
            layer: self.next_layer,
            parameters: None,
        };
        self.next_layer += 1;

        debug!(
            interval_id = %interval.id,
            filter_id = %interval.filter_id,
            start_seconds,
            end_seconds,
            layer = interval.layer,
            "interval added"
        );

        let id = interval.id;
        self.intervals.push(interval);
        id
    }

    /// Remove an interval. Removing an unknown id is a no-op: the UI may
    /// race a duplicate removal.
    pub fn remove(&mut self, id: IntervalId) {
        let before = self.intervals.len();
        self.intervals.retain(|i| i.id != id);
        if self.intervals.len() < before {
            debug!(interval_id = %id, "interval removed");
        }
    }

    /// Move an interval's endpoints, with the same clamping as [`add`].
    /// Resizing an unknown id is a no-op.
    ///
    /// [`add`]: TimelineEngine::add
    pub fn resize(&mut self, id: IntervalId, start: f64, end: f64) {
        let (start_seconds, end_seconds) = self.clamp_range(start, end);
        if let Some(interval) = self.intervals.iter_mut().find(|i| i.id == id) {
            interval.start_seconds = start_seconds;
            interval.end_seconds = end_seconds;
            debug!(interval_id = %id, start_seconds, end_seconds, "interval resized");
        }
    }

    /// Attach free-form parameters to an interval (no-op on unknown id).
    pub fn set_parameters(&mut self, id: IntervalId, parameters: Value) {
        if let Some(interval) = self.intervals.iter_mut().find(|i| i.id == id) {
            interval.parameters = Some(parameters);
        }
    }

    /// Every interval covering `t`, ordered by ascending layer.
    ///
    /// The ordering is the composition order: effect fragments are
    /// concatenated in it, so two overlapping filters swap their rendered
    /// result exactly when their insertion order swaps.
    pub fn active_at(&self, t: f64) -> Vec<&TimelineInterval> {
        let mut active: Vec<&TimelineInterval> =
            self.intervals.iter().filter(|i| i.contains(t)).collect();
        active.sort_by_key(|i| i.layer);
        active
    }

    /// Concatenated effect string for playback instant `t`.
    pub fn playback_effect(&self, t: f64) -> String {
        let fragments: Vec<String> = self
            .active_at(t)
            .into_iter()
            .filter_map(TimelineInterval::effect_fragment)
            .collect();
        fragments.join(" ")
    }

    pub fn intervals(&self) -> &[TimelineInterval] {
        &self.intervals
    }

    pub fn clear(&mut self) {
        self.intervals.clear();
        self.next_layer = 0;
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    fn clamp_range(&self, start: f64, end: f64) -> (f64, f64) {
        // max/min instead of clamp: NaN degrades to 0 rather than propagating.
        let start = start.max(0.0).min(self.duration_seconds);
        let end = end.max(0.0).min(self.duration_seconds);
        if end < start {
            (end, start)
        } else {
            (start, end)
        }
    }
}

fn sanitize(duration: f64) -> f64 {
    if duration.is_finite() {
        duration.max(0.0)
    } else {
        0.0
    }
}
