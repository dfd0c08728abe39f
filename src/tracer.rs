/*!
 * Tracing Setup
 * Installs the global tracing subscriber for the pspawn binary
 *
 * Library code only emits events; embedding applications choose their own
 * subscriber. Output goes to stderr so stdout stays free for reports.
 */

use crate::config::Config;
use tracing::debug;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize structured tracing from `config`
///
/// JSON output with full span events when `trace_json` is set, compact
/// human-readable output otherwise. Returns false when a global subscriber
/// was already installed.
pub fn init_tracing(config: &Config) -> bool {
    let env_filter =
        EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if config.trace_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::FULL),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        debug!(json = config.trace_json, filter = %config.log_filter, "tracing initialized");
    }
    installed
}
