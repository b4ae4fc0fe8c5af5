//! Logging setup.
//!
//! Logs go to stderr so stdout stays usable for JSON and SARIF output.

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Default filter directive for a `-v` count.
pub fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Build the filter: `RUST_LOG` when set and valid, else the `-v` level.
pub fn filter_for(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbose)))
}

/// Initialize tracing for the process. Later calls are ignored.
pub fn init_logging(verbose: u8) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbose))
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 3)
        .try_init()
        .is_ok();

    if installed {
        debug!(verbose, "logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(3), "trace");
        assert_eq!(level_for(9), "trace");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(0);
        init_logging(2);
    }
}
