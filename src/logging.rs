//! File based logging. The terminal belongs to the UI, so nothing is written to stdout.
//!
//! The level comes from the `-v` count and can be overridden with `RUST_LOG`.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::Level;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::TVError;

pub fn level_for_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Expands `~` and environment variables in the log path.
pub fn expand_path(path: &str) -> Result<PathBuf, TVError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| TVError::LoggingFailed(e.to_string()))
}

pub fn init_logging(log_file: &str, verbosity: u8) -> Result<(), TVError> {
    let path = expand_path(log_file)?;
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let level = level_for_verbosity(verbosity);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("otv={}", level.as_str().to_lowercase())));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| TVError::LoggingFailed(e.to_string()))?;

    tracing::info!("Logging to {} at {}", path.display(), level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for_verbosity(0), Level::INFO);
        assert_eq!(level_for_verbosity(1), Level::DEBUG);
        assert_eq!(level_for_verbosity(2), Level::TRACE);
        assert_eq!(level_for_verbosity(9), Level::TRACE);
    }

    #[test]
    fn plain_paths_are_unchanged() {
        assert_eq!(expand_path("/tmp/otv.log").unwrap(), PathBuf::from("/tmp/otv.log"));
    }

    #[test]
    fn unknown_variables_fail() {
        assert!(matches!(
            expand_path("$OTV_SURELY_NOT_SET_VARIABLE/otv.log"),
            Err(TVError::LoggingFailed(_))
        ));
    }
}
