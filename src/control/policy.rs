use crate::control::state::duration_nanos;
use std::time::Duration;

/// Strategy deciding the next cooldown from the trailing utilization average
/// and the fee trend flag. Only consulted once the telemetry window is warm.
pub trait CooldownPolicy: Send + Sync + 'static {
    fn next_cooldown(&self, current: Duration, average_utilization: u64, going_down: bool) -> Duration;
}

/// Two-threshold hysteresis:
/// - trend flag set and average above `busy_percent`: double the cooldown
/// - trend flag clear and average below `idle_percent`: `old / 2 + 1ns`
/// - anything else: unchanged
#[derive(Debug, Clone)]
pub struct HysteresisPolicy {
    pub busy_percent: u64,
    pub idle_percent: u64,
}

impl Default for HysteresisPolicy {
    fn default() -> Self {
        Self { busy_percent: 40, idle_percent: 70 }
    }
}

impl CooldownPolicy for HysteresisPolicy {
    fn next_cooldown(&self, current: Duration, average_utilization: u64, going_down: bool) -> Duration {
        let nanos = duration_nanos(current);
        if going_down {
            if average_utilization > self.busy_percent {
                return Duration::from_nanos(nanos.saturating_mul(2));
            }
        } else if average_utilization < self.idle_percent {
            return Duration::from_nanos(nanos / 2 + 1);
        }
        current
    }
}
