use tracing_subscriber::EnvFilter;

/// Default filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,weft_base=debug";

/// Install a fmt subscriber honouring `RUST_LOG`.
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Install a fmt subscriber with `fallback` as the filter when `RUST_LOG` is unset.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_with_filter(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    if let Err(err) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        tracing::debug!("keeping the installed subscriber: {}", err);
    }
}
