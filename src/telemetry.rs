use crate::config::AppConfig;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_subscriber::fmt::time::UtcTime;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// JSON trace file for capture and session events.
pub(crate) fn tracing_log_path() -> PathBuf {
    env::var("VOXRING_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("voxring_trace.jsonl"))
}

/// Install the global JSON subscriber once, when file logging is enabled.
pub(crate) fn init_tracing(config: &AppConfig) {
    if !config.logging_enabled() {
        return;
    }

    let _ = TRACING_INIT.get_or_init(|| {
        let path = tracing_log_path();
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(_) => return,
        };
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(file)
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn disabled_logging_skips_subscriber() {
        let config = AppConfig::parse_from(["voxring", "--no-logs"]);
        init_tracing(&config);
        assert!(TRACING_INIT.get().is_none());
    }

    #[test]
    fn trace_path_defaults_to_jsonl() {
        if env::var_os("VOXRING_TRACE_LOG").is_none() {
            assert!(tracing_log_path().ends_with("voxring_trace.jsonl"));
        }
    }
}
