use crate::config::AppConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber from application config.
///
/// `RUST_LOG` wins over the configured level so operators can raise
/// verbosity without touching config files. Safe to call more than once;
/// later calls are no-ops.
pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    if config.log_json {
        let _ = fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        init_tracing(&cfg);
        // Second call must not panic even though a global subscriber is set.
        init_tracing(&cfg);
    }
}
