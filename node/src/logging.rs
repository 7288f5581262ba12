//! # Log Setup
//!
//! Every subcommand prints its JSON report on stdout, so diagnostics go to
//! stderr. `RUST_LOG` takes precedence over `--log-level`.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How log lines are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Colored, with source locations. For operators at a terminal.
    Pretty,
    /// One JSON object per event. For log shippers.
    Json,
}

/// Build the filter: `RUST_LOG` if set and valid, else `fallback`.
fn filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber. Must run once, before the first event.
///
/// Per-transaction commit and rollback events are logged at `debug` by
/// `tessera_protocol`; rejections at `warn`:
///
/// ```text
/// RUST_LOG=tessera_protocol=debug tessera-node commit -b block.json
/// ```
pub fn init_logging(fallback: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(filter(fallback));

    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    tracing::debug!(?format, "logging ready");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_parse_from_flag_values() {
        assert_eq!(LogFormat::from_str("json", true).unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("PRETTY", true).unwrap(), LogFormat::Pretty);
        assert!(LogFormat::from_str("xml", true).is_err());
    }
}
