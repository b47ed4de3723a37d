//! Measured row sizes keyed by logical index.

use std::collections::HashMap;

/// Smallest size a row can occupy. Zero or negative measurements are raised
/// to this so cumulative offsets stay strictly increasing.
pub const MIN_ROW_SIZE: f64 = 1.0;

/// Last observed size of each rendered row, with a fallback estimate for rows
/// never measured.
///
/// Keys are logical indices (positions in the current filtered + sorted
/// order), so the cache must be cleared whenever that order changes.
#[derive(Debug, Clone)]
pub struct MeasurementCache {
    estimate: f64,
    min_size: f64,
    measured: HashMap<usize, f64>,
}

impl MeasurementCache {
    pub fn new(estimate: f64, min_size: f64) -> Self {
        let min_size = sanitize_min(min_size);
        Self {
            estimate: clamp_size(estimate, min_size, min_size),
            min_size,
            measured: HashMap::new(),
        }
    }

    /// Size used for `index`: the measurement if there is one, else the estimate.
    pub fn estimate(&self, index: usize) -> f64 {
        self.measured.get(&index).copied().unwrap_or(self.estimate)
    }

    pub fn is_measured(&self, index: usize) -> bool {
        self.measured.contains_key(&index)
    }

    /// Store a measurement, overwriting any earlier one.
    ///
    /// Returns the clamped size now in effect and the previous effective size.
    pub fn record(&mut self, index: usize, size: f64) -> (f64, f64) {
        let previous = self.estimate(index);
        let size = clamp_size(size, self.min_size, self.estimate);
        self.measured.insert(index, size);
        (size, previous)
    }

    /// Forget every measurement at `index` or beyond.
    pub fn invalidate_from(&mut self, index: usize) {
        self.measured.retain(|&i, _| i < index);
    }

    pub fn clear(&mut self) {
        self.invalidate_from(0);
    }

    pub fn default_estimate(&self) -> f64 {
        self.estimate
    }

    pub fn min_size(&self) -> f64 {
        self.min_size
    }

    pub fn measured_count(&self) -> usize {
        self.measured.len()
    }
}

fn sanitize_min(min_size: f64) -> f64 {
    if min_size.is_finite() && min_size > 0.0 {
        min_size
    } else {
        MIN_ROW_SIZE
    }
}

/// Clamp to `min`, mapping non-finite input to `fallback`.
fn clamp_size(size: f64, min: f64, fallback: f64) -> f64 {
    if size.is_finite() {
        size.max(min)
    } else {
        fallback.max(min)
    }
}
