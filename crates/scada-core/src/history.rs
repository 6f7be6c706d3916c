use serde::Serialize;
use std::collections::VecDeque;

pub const MAX_POINTS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsPoint {
    /// Epoch seconds.
    pub at: f64,
    pub cpu_percent: f64,
    pub memory_mb: f64,
    pub total_tags: u64,
}

/// Rolling window of dashboard samples; the oldest point is evicted first.
#[derive(Debug, Clone, Default)]
pub struct MetricsHistory {
    points: VecDeque<MetricsPoint>,
}

impl MetricsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: MetricsPoint) {
        if self.points.len() == MAX_POINTS {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&MetricsPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricsPoint> {
        self.points.iter()
    }
}
