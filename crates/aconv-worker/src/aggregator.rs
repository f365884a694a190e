//! Global progress aggregation across the tasks of one batch.
//!
//! Task `i` of `n` owns the slice `[⌊i·100/n⌋, ⌊(i+1)·100/n⌋)` of the 0–100
//! scale, so the display sweeps once across the whole batch instead of
//! resetting per file. Slice bounds use exact integer floor division.

/// The part of the global scale reserved for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: u8,
    pub end: u8,
}

impl Slice {
    /// Slice for task `index` (0-based) of a batch of `total` tasks.
    pub fn for_task(index: usize, total: usize) -> Self {
        assert!(total > 0 && index < total, "task {index} out of range for batch of {total}");
        Self {
            start: (index * 100 / total) as u8,
            end: ((index + 1) * 100 / total) as u8,
        }
    }

    pub fn width(&self) -> u8 {
        self.end - self.start
    }

    /// Global percent for a task-local fraction in `[0, 1]`.
    pub fn percent_at(&self, fraction: f64) -> u8 {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        self.start + (fraction * f64::from(self.width())).floor() as u8
    }
}

/// Monotonic filter in front of the display surface.
///
/// This is the batch's only progress state; it is owned by the controller and
/// never decreases within a run.
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    total: usize,
    last_forwarded: Option<u8>,
}

impl ProgressAggregator {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            last_forwarded: None,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn slice(&self, index: usize) -> Slice {
        Slice::for_task(index, self.total)
    }

    pub fn last_forwarded(&self) -> Option<u8> {
        self.last_forwarded
    }

    /// Mid-task tick: returns the value to forward only if it strictly exceeds
    /// the last forwarded value.
    pub fn advance(&mut self, percent: u8) -> Option<u8> {
        match self.last_forwarded {
            Some(last) if percent <= last => None,
            _ => {
                self.last_forwarded = Some(percent);
                Some(percent)
            }
        }
    }

    /// Stage checkpoint (new label): always forwarded, never below the last value.
    pub fn checkpoint(&mut self, percent: u8) -> u8 {
        let value = self.last_forwarded.map_or(percent, |last| last.max(percent));
        self.last_forwarded = Some(value);
        value
    }
}
