//! Fixed-length trigger window with an O(1) running sum.
//!
//! The window starts zero-filled, so the average always divides by the full
//! window length, including before `len` real samples have arrived. The sum
//! is kept in `i128` so a window of extreme `i64` readings cannot overflow.

/// Circular history of the most recent integer samples.
#[derive(Debug, Clone)]
pub struct TriggerWindow {
    samples: Vec<i64>,
    /// Slot that holds the oldest sample (and receives the next one)
    head: usize,
    sum: i128,
}

impl TriggerWindow {
    /// Create a zero-filled window of `len` slots. A zero length is raised to one.
    pub fn new(len: usize) -> Self {
        Self {
            samples: vec![0; len.max(1)],
            head: 0,
            sum: 0,
        }
    }

    /// Evict the oldest sample, append `value`, and return the new average.
    pub fn push(&mut self, value: i64) -> i64 {
        self.sum -= i128::from(self.samples[self.head]);
        self.samples[self.head] = value;
        self.sum += i128::from(value);
        self.head = (self.head + 1) % self.samples.len();
        self.average()
    }

    /// Truncating mean over the whole window.
    pub fn average(&self) -> i64 {
        // The mean of i64 samples always fits back into i64
        (self.sum / self.samples.len() as i128) as i64
    }

    pub fn sum(&self) -> i128 {
        self.sum
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        let (newer, older) = self.samples.split_at(self.head);
        older.iter().chain(newer.iter()).copied()
    }

    /// Zero every slot.
    pub fn clear(&mut self) {
        self.samples.iter_mut().for_each(|s| *s = 0);
        self.head = 0;
        self.sum = 0;
    }
}
