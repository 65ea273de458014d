use tracing_subscriber::{fmt, EnvFilter};

use crate::settings::AppConfig;

/// Installs the global subscriber: JSON lines in production, human-readable
/// output otherwise. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if config.is_production() {
        fmt().with_env_filter(filter).json().try_init()
    } else {
        fmt().with_env_filter(filter).try_init()
    };

    if let Err(e) = result {
        eprintln!("Tracing subscriber already installed: {}", e);
    }
}
