/// Fixed-capacity rolling window reporting the median of its held samples.
///
/// The median is the element at index `count / 2` of the ascending sort of
/// the currently held samples. For even counts that is the upper-middle
/// element, not an average of the two middles; callers depend on this
/// tie-break.
pub struct MedianWindow {
    buffer: Vec<f64>,
    scratch: Vec<f64>,
    write: usize,
    count: usize,
    median: f64,
}

impl MedianWindow {
    /// A zero capacity is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: vec![0.0; capacity],
            scratch: vec![0.0; capacity],
            write: 0,
            count: 0,
            median: 0.0,
        }
    }

    /// Insert a sample, evicting the oldest once the window is full, and
    /// return the updated median.
    ///
    /// Inputs are not validated: negative or NaN samples are held like any
    /// other value (the sort uses a total order, so the result stays
    /// deterministic).
    pub fn insert(&mut self, sample: f64) -> f64 {
        if self.count < self.buffer.len() {
            self.count += 1;
        }
        self.buffer[self.write] = sample;
        self.write = (self.write + 1) % self.buffer.len();

        self.scratch[..self.count].copy_from_slice(&self.buffer[..self.count]);
        self.scratch[..self.count].sort_unstable_by(f64::total_cmp);
        self.median = self.scratch[self.count / 2];
        self.median
    }

    /// Median of the currently held samples; 0.0 before the first insert.
    pub fn value(&self) -> f64 {
        self.median
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
