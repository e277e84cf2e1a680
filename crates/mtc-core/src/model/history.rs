// ── Bounded sample history ──

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use serde::Serialize;

use super::DataItemSample;

/// Capacity used when the probe does not configure a buffer size.
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Capacity-bounded, oldest-first sequence of samples for one data item.
///
/// Appending past capacity evicts from the front, so the history always
/// holds the most recent `capacity` samples in chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleHistory {
    capacity: usize,
    samples: VecDeque<DataItemSample>,
}

impl SampleHistory {
    /// Create an empty history. A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Change the capacity. Shrinking evicts the oldest samples first.
    pub fn set_capacity(&mut self, capacity: NonZeroUsize) {
        self.capacity = capacity.get();
        let excess = self.samples.len().saturating_sub(self.capacity);
        self.samples.drain(..excess);
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn push(&mut self, sample: DataItemSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// The most recently appended sample.
    pub fn current(&self) -> Option<&DataItemSample> {
        self.samples.back()
    }

    /// The sample appended immediately before [`current`](Self::current).
    pub fn previous(&self) -> Option<&DataItemSample> {
        self.samples
            .len()
            .checked_sub(2)
            .and_then(|i| self.samples.get(i))
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, DataItemSample> {
        self.samples.iter()
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }
}
