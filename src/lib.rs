//! txfuzz: an adaptive transaction fuzzer for Ethereum-style nodes.
//!
//! Account workers send randomly synthesized transactions; a block watcher
//! measures how full the chain is and tunes the shared fee cap and send
//! cooldown; a replenisher keeps the workers funded.

pub mod airdrop;
pub mod chain;
pub mod control;
pub mod crypto;
pub mod node;
pub mod txgen;
pub mod utils;
pub mod watcher;
pub mod worker;
