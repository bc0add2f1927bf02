//! Console-side collaborators handed to the engine.

use sampler_traits::{Channel, TranscriptSink, Visualizer};
use serde_json::json;
use tracing::debug;

/// Echoes the transcript on stdout, one line per entry.
pub struct StdoutTranscript {
    json: bool,
}

impl StdoutTranscript {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl TranscriptSink for StdoutTranscript {
    fn append_line(&mut self, text: &str) {
        if self.json {
            println!("{}", json!({ "transcript": text }));
        } else {
            println!("{text}");
        }
    }
}

/// Headless plot: every update becomes a debug event on the `plot` target.
#[derive(Default)]
pub struct TracingVisualizer;

impl Visualizer for TracingVisualizer {
    fn update_series(&mut self, kind: Channel, xs: &[u64], ys: &[f64], session_index: usize) {
        debug!(
            target: "plot",
            %kind,
            session_index,
            points = xs.len(),
            last_t = xs.last().copied(),
            last_v = ys.last().copied(),
            "series"
        );
    }

    fn rescale_time(&mut self, limit_ms: u64) {
        debug!(target: "plot", limit_ms, "time axis");
    }

    fn rescale_value(&mut self, kind: Channel, lower: f64, upper: f64) {
        debug!(target: "plot", %kind, lower, upper, "value axis");
    }

    fn redraw(&mut self) {}

    fn clear(&mut self) {
        debug!(target: "plot", "cleared");
    }
}
