//! Visualizer doubles for headless runs and tests.

use std::cell::RefCell;
use std::rc::Rc;

use sampler_traits::{Channel, Visualizer};

/// Ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullVisualizer;

impl Visualizer for NullVisualizer {
    fn update_series(&mut self, _kind: Channel, _xs: &[u64], _ys: &[f64], _session_index: usize) {}
    fn rescale_time(&mut self, _limit_ms: u64) {}
    fn rescale_value(&mut self, _kind: Channel, _lower: f64, _upper: f64) {}
    fn redraw(&mut self) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum VisualEvent {
    Series {
        kind: Channel,
        points: usize,
        session_index: usize,
    },
    Time(u64),
    Value {
        kind: Channel,
        lower: f64,
        upper: f64,
    },
    Redraw,
    Clear,
}

/// Records every call. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct RecordingVisualizer {
    events: Rc<RefCell<Vec<VisualEvent>>>,
}

impl RecordingVisualizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<VisualEvent> {
        self.events.borrow().clone()
    }

    /// Last value-axis range sent for `kind`.
    pub fn last_value_bounds(&self, kind: Channel) -> Option<(f64, f64)> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            VisualEvent::Value { kind: k, lower, upper } if *k == kind => Some((*lower, *upper)),
            _ => None,
        })
    }

    fn push(&self, e: VisualEvent) {
        self.events.borrow_mut().push(e);
    }
}

impl Visualizer for RecordingVisualizer {
    fn update_series(&mut self, kind: Channel, xs: &[u64], ys: &[f64], session_index: usize) {
        debug_assert_eq!(xs.len(), ys.len());
        self.push(VisualEvent::Series {
            kind,
            points: xs.len(),
            session_index,
        });
    }

    fn rescale_time(&mut self, limit_ms: u64) {
        self.push(VisualEvent::Time(limit_ms));
    }

    fn rescale_value(&mut self, kind: Channel, lower: f64, upper: f64) {
        self.push(VisualEvent::Value { kind, lower, upper });
    }

    fn redraw(&mut self) {
        self.push(VisualEvent::Redraw);
    }

    fn clear(&mut self) {
        self.push(VisualEvent::Clear);
    }
}
