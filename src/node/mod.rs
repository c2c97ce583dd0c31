pub mod cli;
pub mod config;
pub mod engine;
pub mod service_handle;

pub use cli::run_cli;
pub use config::FuzzConfig;
pub use engine::Fuzzer;
pub use service_handle::{sleep_or_shutdown, until_shutdown, ServiceHandle};
