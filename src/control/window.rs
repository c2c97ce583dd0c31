/// Ring of the last `capacity` block utilization percentages, indexed by
/// `block_number % capacity`, with a running sum for O(1) averages.
#[derive(Debug, Clone)]
pub struct TelemetryWindow {
    samples: Vec<u64>,
    sum: u64,
    observed: u64,
}

impl TelemetryWindow {
    pub fn new(capacity: usize) -> Self {
        Self { samples: vec![0; capacity.max(1)], sum: 0, observed: 0 }
    }

    /// Store `utilization` for `block_number`, evicting whatever held the slot.
    pub fn insert(&mut self, block_number: u64, utilization: u64) {
        let slot = (block_number % self.samples.len() as u64) as usize;
        self.sum -= self.samples[slot];
        self.samples[slot] = utilization;
        self.sum += utilization;
        self.observed = self.observed.saturating_add(1);
    }

    /// True once a full window of samples has been observed.
    pub fn is_warm(&self) -> bool {
        self.observed >= self.samples.len() as u64
    }

    /// Trailing average, only once warm.
    pub fn average(&self) -> Option<u64> {
        if self.is_warm() {
            Some(self.sum / self.samples.len() as u64)
        } else {
            None
        }
    }

    pub fn sum(&self) -> u64 {
        self.sum
    }
}
