//! Tracing setup for processes embedding the wellness store.
//!
//! The library itself only emits events; a host application installs a
//! subscriber once at startup, usually from its loaded [`Config`].

use crate::config::{Config, LoggingConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber using the `[logging]` section of `config`
///
/// `RUST_LOG` wins over the configured level when set.
///
/// # Examples
///
/// ```no_run
/// let config = devwell_core::Config::load()?;
/// devwell_core::logging::init_from_config(&config);
/// # Ok::<(), devwell_core::Error>(())
/// ```
pub fn init_from_config(config: &Config) {
    init_with_level(&config.logging.level)
}

/// Install the global subscriber with `default_level` as the fallback filter
///
/// Does nothing if a subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// devwell_core::logging::init_with_level("devwell_core=debug,warn");
/// ```
pub fn init_with_level(default_level: &str) {
    let _ = tracing_subscriber::registry()
        .with(filter_for(default_level))
        .with(fmt::layer().compact().with_target(false))
        .try_init();
}

fn filter_for(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(default_level).unwrap_or_else(|e| {
            eprintln!(
                "Invalid log filter {:?} ({}), falling back to {}",
                default_level,
                e,
                LoggingConfig::DEFAULT_LEVEL
            );
            EnvFilter::new(LoggingConfig::DEFAULT_LEVEL)
        })
    })
}

/// Route events through the test writer so they show with `--nocapture`
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        // Only meaningful when RUST_LOG is unset; either way it must not panic
        let filter = filter_for("devwell_core=loud");
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(filter.to_string(), LoggingConfig::DEFAULT_LEVEL);
        }
    }
}
