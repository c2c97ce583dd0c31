//! Account workers: one infinite submission loop per derived account.

pub mod nonce;
pub mod account_worker;

pub use nonce::NonceCursor;
pub use account_worker::{AccountWorker, StepOutcome, WorkerConfig};
