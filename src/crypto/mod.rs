//! Crypto module: account derivation, signing and sender recovery.
//!
//! - Keys: HD derivation of fuzzing accounts, funding key parsing
//! - Sign: EIP-155 / EIP-1559 signing and secp256k1 sender recovery

pub mod keys;
pub mod sign;

pub use keys::{derive_accounts, parse_private_key, Account};
pub use sign::{recover_sender, sign_transaction, SignedTx};
