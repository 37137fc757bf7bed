//! Tracing subscriber setup

use crate::config::ObservabilityConfig;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Calling this twice is harmless,
/// the second installation is ignored.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json_logging {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };

    if installed.is_ok() {
        tracing::info!(service = %config.service_name, "Tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_init_is_harmless() {
        let config = ObservabilityConfig {
            json_logging: false,
            ..ObservabilityConfig::default()
        };
        init_tracing(&config);
        init_tracing(&config);
    }
}
