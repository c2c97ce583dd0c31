use thiserror::Error;

/// Unified error type for the fuzzer
#[derive(Error, Debug, Clone)]
pub enum FuzzError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("Send error: {0}")]
    Send(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Task error: {0}")]
    Task(String),
}

/// Convenience alias
pub type Result<T> = std::result::Result<T, FuzzError>;
