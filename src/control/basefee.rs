use ethers::types::U256;

/// Base fee of the first fee-market block, 1 gwei.
pub const INITIAL_BASE_FEE: u64 = 1_000_000_000;
pub const ELASTICITY_MULTIPLIER: u64 = 2;
pub const BASE_FEE_CHANGE_DENOMINATOR: u64 = 8;

/// Base fee of the block following a parent with the given figures.
/// A parent without a base fee predates the fee market and yields `INITIAL_BASE_FEE`.
pub fn next_base_fee(gas_used: U256, gas_limit: U256, base_fee: Option<U256>) -> U256 {
    let base_fee = match base_fee {
        Some(b) => b,
        None => return U256::from(INITIAL_BASE_FEE),
    };
    let target = gas_limit / ELASTICITY_MULTIPLIER;
    if target.is_zero() || gas_used == target {
        return base_fee;
    }

    if gas_used > target {
        let delta = base_fee.saturating_mul(gas_used - target) / target / BASE_FEE_CHANGE_DENOMINATOR;
        base_fee.saturating_add(delta.max(U256::one()))
    } else {
        let delta = base_fee.saturating_mul(target - gas_used) / target / BASE_FEE_CHANGE_DENOMINATOR;
        base_fee.saturating_sub(delta)
    }
}
