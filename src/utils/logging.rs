use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `verbose` lowers the default level to debug,
/// which is where every individual send is reported. `RUST_LOG` wins over both.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("txfuzz={}", default_level)));

    // a second init (tests, embedding) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .try_init();
}
