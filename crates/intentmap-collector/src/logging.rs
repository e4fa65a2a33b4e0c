use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber for the collector's tracing output.
///
/// `RUST_LOG` wins when set; otherwise the default level is `info`, raised
/// to `debug` for the intentmap crates when the config debug flag is on.
/// Safe to call more than once — later calls are no-ops.
pub fn init_logging(debug: bool) {
    let default_filter = if debug {
        "info,intentmap=debug,intentmap_core=debug,intentmap_store=debug,intentmap_transport=debug,intentmap_collector=debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
