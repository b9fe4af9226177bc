//! Logging initialization for the `vellum` binary.
//!
//! Controlled by two environment variables:
//! - `VELLUM_LOG`: an `EnvFilter` directive (`info`, `vellum=debug`, ...).
//!   Defaults to `warn`.
//! - `VELLUM_LOG_FORMAT`: `json` for one JSON object per event, anything else
//!   for compact text.
//!
//! Output always goes to stderr so stdout stays clean JSON.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Filter directive variable.
pub const LOG_ENV: &str = "VELLUM_LOG";

/// Output format variable.
pub const FORMAT_ENV: &str = "VELLUM_LOG_FORMAT";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the global subscriber. Call once, early in `main`.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let json = std::env::var(FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    // A subscriber may already be set (e.g. by a test harness); keep it.
    let _ = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}
