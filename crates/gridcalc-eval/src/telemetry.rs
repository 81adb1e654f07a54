//! Optional ready-made `tracing` subscriber for hosts that have none.

/// Install a formatting subscriber filtered by `RUST_LOG` (default `warn`).
///
/// Returns `false` when a global subscriber was already set, or when the
/// crate was built without the `tracing` feature.
#[cfg(feature = "tracing")]
pub fn init_tracing() -> bool {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .try_init()
        .is_ok()
}

#[cfg(not(feature = "tracing"))]
pub fn init_tracing() -> bool {
    false
}
