use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_DIRECTIVE: &str = "info,sqlx=warn,sea_orm=warn";

/// Initialize structured JSON tracing on stdout. Call once at service startup.
///
/// Honors `RUST_LOG`; falls back to `info` with noisy database crates at `warn`.
/// Subsequent calls are silently ignored.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_current_span(false))
        .try_init();
}
