//! Block watcher: the only writer of the published fee cap and cooldown.

pub mod block_watcher;

pub use block_watcher::{BlockReport, BlockWatcher};
