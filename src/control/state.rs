use ethers::types::U256;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Published fee cap and cooldown. The block watcher is the only writer;
/// workers and the replenisher read without blocking. The two cells are
/// independent, a reader may see a fresh fee cap next to the previous cooldown.
#[derive(Debug)]
pub struct FeeState {
    fee_cap_wei: AtomicU64,
    cooldown_nanos: AtomicU64,
}

impl FeeState {
    pub fn new(fee_cap: U256, cooldown: Duration) -> Self {
        Self {
            fee_cap_wei: AtomicU64::new(clamp_u64(fee_cap)),
            cooldown_nanos: AtomicU64::new(duration_nanos(cooldown)),
        }
    }

    pub fn fee_cap(&self) -> U256 {
        U256::from(self.fee_cap_wei.load(Ordering::Acquire))
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_nanos(self.cooldown_nanos.load(Ordering::Acquire))
    }

    /// Values above `u64::MAX` wei per gas saturate.
    pub fn publish_fee_cap(&self, fee_cap: U256) {
        self.fee_cap_wei.store(clamp_u64(fee_cap), Ordering::Release);
    }

    pub fn publish_cooldown(&self, cooldown: Duration) {
        self.cooldown_nanos.store(duration_nanos(cooldown), Ordering::Release);
    }
}

fn clamp_u64(v: U256) -> u64 {
    if v > U256::from(u64::MAX) {
        u64::MAX
    } else {
        v.as_u64()
    }
}

pub(crate) fn duration_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
