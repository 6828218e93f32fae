use tracing_subscriber::EnvFilter;

/// Log to stderr so rendered output on stdout stays clean.
/// `RUST_LOG` wins over the default level.
pub fn init(verbose: bool) {
    let default_level = if verbose { "sahayak=debug" } else { "sahayak=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
