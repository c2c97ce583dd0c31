//! Balance replenisher ("airdrop"): keeps every fuzzing account topped up
//! from the funding account, once at startup and then periodically.

pub mod replenisher;

pub use replenisher::{AirdropConfig, AirdropReport, Replenisher};
