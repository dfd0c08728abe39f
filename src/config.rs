/*!
 * Configuration
 * Runtime settings read from environment variables
 *
 * - RUST_LOG: log filter (default: info)
 * - PSPAWN_TRACE_JSON: JSON log output when "1" or "true" (default: false)
 * - PSPAWN_CLOSE_SIGNAL: close signal for requests that do not name one
 *   (default: SIGTERM)
 */

use crate::errors::{SpawnError, SpawnResult};
use crate::signals::{NO_SIGNAL, SIGTERM};
use libc::c_int;

pub const ENV_LOG_FILTER: &str = "RUST_LOG";
pub const ENV_TRACE_JSON: &str = "PSPAWN_TRACE_JSON";
pub const ENV_CLOSE_SIGNAL: &str = "PSPAWN_CLOSE_SIGNAL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_filter: String,
    pub trace_json: bool,
    pub close_signal: c_int,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            trace_json: false,
            close_signal: SIGTERM,
        }
    }
}

impl Config {
    pub fn from_env() -> SpawnResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> SpawnResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(filter) = lookup(ENV_LOG_FILTER).filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }

        if let Some(json) = lookup(ENV_TRACE_JSON) {
            config.trace_json = matches!(json.trim(), "1" | "true");
        }

        if let Some(raw) = lookup(ENV_CLOSE_SIGNAL) {
            let sig: c_int = raw.trim().parse().map_err(|_| {
                SpawnError::InvalidCloseSignal(format!(
                    "{} must be a signal number, got {:?}",
                    ENV_CLOSE_SIGNAL, raw
                ))
            })?;
            if sig == NO_SIGNAL {
                return Err(SpawnError::InvalidCloseSignal(format!(
                    "invalid value for {}: {}",
                    ENV_CLOSE_SIGNAL, sig
                )));
            }
            config.close_signal = sig;
        }

        Ok(config)
    }
}
