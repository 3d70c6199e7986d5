//! Circular raw-sample history.

/// Fixed-capacity ring of raw samples.
///
/// `write_index` is the slot the next sample lands in; `live_count` is how
/// many slots hold samples since the last reset (saturating at capacity).
#[derive(Debug, Clone)]
pub struct SampleRing {
    data: Vec<f32>,
    write_index: usize,
    live_count: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity.max(1)],
            write_index: 0,
            live_count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn write_index(&self) -> usize {
        self.write_index
    }

    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Append samples, overwriting the oldest. Non-finite samples are stored as silence.
    pub fn push_slice(&mut self, samples: &[f32]) {
        let cap = self.data.len();
        for &s in samples {
            self.data[self.write_index] = if s.is_finite() { s } else { 0.0 };
            self.write_index = (self.write_index + 1) % cap;
        }
        self.live_count = (self.live_count + samples.len()).min(cap);
    }

    /// The most recent `n` samples in chronological order, widened to f64.
    pub fn latest(&self, n: usize) -> Vec<f64> {
        let cap = self.data.len();
        let n = n.min(self.live_count);
        let start = (self.write_index + cap - n) % cap;
        (0..n)
            .map(|i| self.data[(start + i) % cap] as f64)
            .collect()
    }

    /// Forget history: rewind to slot zero and silence the first `head` slots.
    pub fn reset(&mut self, head: usize) {
        let head = head.min(self.data.len());
        self.data[..head].fill(0.0);
        self.write_index = 0;
        self.live_count = 0;
    }

    /// Raw storage, oldest-to-newest order not guaranteed.
    pub fn raw(&self) -> &[f32] {
        &self.data
    }
}
