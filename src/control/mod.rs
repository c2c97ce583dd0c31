//! Rate/fee control: turns block telemetry into the fee cap and the
//! inter-send cooldown every worker reads.
//!
//! - basefee: EIP-1559 next-block base fee rule
//! - window: fixed ring of recent block utilization samples
//! - state: lock-free fee cap / cooldown cells (single writer, many readers)
//! - policy: cooldown strategy (hysteresis by default)
//! - controller: glues the above together per observed block

pub mod basefee;
pub mod window;
pub mod state;
pub mod policy;
pub mod controller;

pub use basefee::{next_base_fee, INITIAL_BASE_FEE};
pub use window::TelemetryWindow;
pub use state::FeeState;
pub use policy::{CooldownPolicy, HysteresisPolicy};
pub use controller::{Adjustment, BlockObservation, ControllerConfig, RateController};
