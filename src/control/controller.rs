use crate::control::basefee::next_base_fee;
use crate::control::policy::{CooldownPolicy, HysteresisPolicy};
use crate::control::state::FeeState;
use crate::control::window::TelemetryWindow;
use ethers::types::{Block, U256};
use std::sync::Arc;
use std::time::Duration;

/// Tunables of the rate/fee controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub window_size: usize,
    /// Applied as `(next_base_fee + 1) * fee_margin_percent / 100`.
    pub fee_margin_percent: u64,
    /// Trend flag is raised when `fee_cap * gas_limit` exceeds this.
    pub full_block_max_cost: U256,
    /// Trend flag is cleared once the fee cap falls under this.
    pub trend_recovery_fee_cap: U256,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            fee_margin_percent: 110,
            full_block_max_cost: ethers::utils::WEI_IN_ETHER * 1000u64,
            trend_recovery_fee_cap: U256::from(10_000u64) * U256::exp10(9),
        }
    }
}

/// The block figures the controller needs.
#[derive(Debug, Clone, Copy)]
pub struct BlockObservation {
    pub number: u64,
    pub gas_used: U256,
    pub gas_limit: U256,
    pub base_fee: Option<U256>,
}

impl BlockObservation {
    pub fn from_block<TX>(block: &Block<TX>) -> Self {
        Self {
            number: block.number.map(|n| n.as_u64()).unwrap_or_default(),
            gas_used: block.gas_used,
            gas_limit: block.gas_limit,
            base_fee: block.base_fee_per_gas,
        }
    }

    /// Integer percent of the gas limit consumed, truncating.
    pub fn utilization(&self) -> u64 {
        if self.gas_limit.is_zero() {
            return 0;
        }
        let pct = self.gas_used.saturating_mul(U256::from(100u64)) / self.gas_limit;
        pct.min(U256::from(u64::MAX)).as_u64()
    }
}

/// Outcome of one observation, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustment {
    pub block_number: u64,
    pub utilization: u64,
    pub fee_cap: U256,
    pub previous_cooldown: Duration,
    pub cooldown: Duration,
    /// `None` while the window is still filling.
    pub average_utilization: Option<u64>,
    pub going_down: bool,
}

impl Adjustment {
    pub fn cooldown_changed(&self) -> bool {
        self.cooldown != self.previous_cooldown
    }
}

/// Owns the telemetry window and trend flag; publishes into a shared `FeeState`.
/// Exactly one controller should write to a given `FeeState`.
pub struct RateController<P: CooldownPolicy = HysteresisPolicy> {
    cfg: ControllerConfig,
    window: TelemetryWindow,
    going_down: bool,
    policy: P,
    state: Arc<FeeState>,
}

impl RateController<HysteresisPolicy> {
    pub fn new(cfg: ControllerConfig, state: Arc<FeeState>) -> Self {
        Self::with_policy(cfg, HysteresisPolicy::default(), state)
    }
}

impl<P: CooldownPolicy> RateController<P> {
    pub fn with_policy(cfg: ControllerConfig, policy: P, state: Arc<FeeState>) -> Self {
        let window = TelemetryWindow::new(cfg.window_size);
        Self { cfg, window, going_down: false, policy, state }
    }

    pub fn going_down(&self) -> bool {
        self.going_down
    }

    pub fn window(&self) -> &TelemetryWindow {
        &self.window
    }

    pub fn state(&self) -> &Arc<FeeState> {
        &self.state
    }

    /// Fee cap bid for the block after `obs`.
    pub fn fee_cap_for(&self, obs: &BlockObservation) -> U256 {
        let next = next_base_fee(obs.gas_used, obs.gas_limit, obs.base_fee);
        next.saturating_add(U256::one()).saturating_mul(U256::from(self.cfg.fee_margin_percent)) / 100u64
    }

    /// Fold one block into the controller and publish the resulting fee cap
    /// and cooldown.
    pub fn observe(&mut self, obs: &BlockObservation) -> Adjustment {
        let utilization = obs.utilization();
        let fee_cap = self.fee_cap_for(obs);

        if fee_cap.saturating_mul(obs.gas_limit) > self.cfg.full_block_max_cost {
            self.going_down = true;
        } else if self.going_down && fee_cap < self.cfg.trend_recovery_fee_cap {
            self.going_down = false;
        }

        self.window.insert(obs.number, utilization);

        let previous_cooldown = self.state.cooldown();
        let average_utilization = self.window.average();
        let cooldown = match average_utilization {
            Some(avg) => self.policy.next_cooldown(previous_cooldown, avg, self.going_down),
            None => previous_cooldown,
        };

        self.state.publish_fee_cap(fee_cap);
        if cooldown != previous_cooldown {
            self.state.publish_cooldown(cooldown);
        }

        Adjustment {
            block_number: obs.number,
            utilization,
            fee_cap,
            previous_cooldown,
            cooldown,
            average_utilization,
            going_down: self.going_down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAS_LIMIT: u64 = 30_000_000;
    const GWEI: u64 = 1_000_000_000;

    fn obs(number: u64, utilization: u64, base_fee: u64) -> BlockObservation {
        BlockObservation {
            number,
            gas_used: U256::from(GAS_LIMIT * utilization / 100),
            gas_limit: U256::from(GAS_LIMIT),
            base_fee: Some(U256::from(base_fee)),
        }
    }

    fn controller(cooldown: Duration) -> RateController {
        let state = Arc::new(FeeState::new(U256::from(GWEI + 1), cooldown));
        RateController::new(ControllerConfig::default(), state)
    }

    #[test]
    fn test_utilization_truncates() {
        let o = BlockObservation {
            number: 1,
            gas_used: U256::from(2u64),
            gas_limit: U256::from(3u64),
            base_fee: None,
        };
        assert_eq!(o.utilization(), 66);
    }

    #[test]
    fn test_fee_cap_formula_is_exact() {
        let c = controller(Duration::from_secs(1));
        for (used, base) in [(0u64, 7u64), (15_000_000, GWEI), (29_999_999, 123_456_789), (30_000_000, 3 * GWEI)] {
            let o = BlockObservation {
                number: 1,
                gas_used: U256::from(used),
                gas_limit: U256::from(GAS_LIMIT),
                base_fee: Some(U256::from(base)),
            };
            let next = next_base_fee(o.gas_used, o.gas_limit, o.base_fee);
            let expected = (next + U256::one()) * U256::from(110u64) / U256::from(100u64);
            assert_eq!(c.fee_cap_for(&o), expected);
        }
    }

    #[test]
    fn test_no_cooldown_change_before_window_warm() {
        let mut c = controller(Duration::from_millis(800));
        for n in 0..4 {
            let adj = c.observe(&obs(n, 10, GWEI));
            assert_eq!(adj.average_utilization, None);
            assert!(!adj.cooldown_changed());
            assert_eq!(c.state().cooldown(), Duration::from_millis(800));
        }
        let adj = c.observe(&obs(4, 10, GWEI));
        assert_eq!(adj.average_utilization, Some(10));
        assert_eq!(adj.cooldown, Duration::from_nanos(400_000_001));
    }

    #[test]
    fn test_fee_cap_published_every_block() {
        let mut c = controller(Duration::from_secs(1));
        let adj = c.observe(&obs(1, 50, GWEI));
        assert_eq!(c.state().fee_cap(), adj.fee_cap);
        // half full block keeps base fee: (1gwei + 1) * 1.1
        assert_eq!(adj.fee_cap, U256::from((GWEI + 1) * 110 / 100));
    }

    #[test]
    fn test_trend_flag_set_and_recovered() {
        let mut c = controller(Duration::from_secs(1));
        // 50k gwei * 30M gas is 1500 ether, above the ceiling
        let adj = c.observe(&obs(1, 50, 50_000 * GWEI));
        assert!(adj.going_down);
        // between the recovery threshold and the ceiling: flag holds
        let adj = c.observe(&obs(2, 50, 20_000 * GWEI));
        assert!(adj.going_down);
        let adj = c.observe(&obs(3, 50, 5_000 * GWEI));
        assert!(!adj.going_down);
    }

    #[test]
    fn test_warm_busy_expensive_doubles() {
        let mut c = controller(Duration::from_millis(100));
        let mut last = None;
        for n in 0..5 {
            last = Some(c.observe(&obs(n, 80, 50_000 * GWEI)));
        }
        let adj = last.unwrap();
        assert!(adj.going_down);
        assert_eq!(adj.average_utilization, Some(80));
        assert_eq!(adj.cooldown, Duration::from_millis(200));
        assert_eq!(c.state().cooldown(), Duration::from_millis(200));
    }

    #[test]
    fn test_warm_quiet_cheap_speeds_up() {
        let mut c = controller(Duration::from_nanos(1000));
        for n in 0..4 {
            c.observe(&obs(n, 30, GWEI));
        }
        let adj = c.observe(&obs(4, 30, GWEI));
        assert!(!adj.going_down);
        assert_eq!(adj.cooldown, Duration::from_nanos(501));
    }

    #[test]
    fn test_warm_busy_cheap_unchanged() {
        let mut c = controller(Duration::from_millis(100));
        for n in 0..5 {
            c.observe(&obs(n, 80, GWEI));
        }
        assert_eq!(c.state().cooldown(), Duration::from_millis(100));
    }

    #[test]
    fn test_custom_policy() {
        struct Fixed;
        impl CooldownPolicy for Fixed {
            fn next_cooldown(&self, _: Duration, _: u64, _: bool) -> Duration {
                Duration::from_millis(7)
            }
        }
        let state = Arc::new(FeeState::new(U256::one(), Duration::from_secs(1)));
        let cfg = ControllerConfig { window_size: 1, ..Default::default() };
        let mut c = RateController::with_policy(cfg, Fixed, state.clone());
        c.observe(&obs(9, 50, GWEI));
        assert_eq!(state.cooldown(), Duration::from_millis(7));
    }
}
