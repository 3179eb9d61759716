use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Filter used when neither `MESHDECK_LOG` nor `RUST_LOG` is set. Poll and
/// lifecycle events come from the registry and engine crates.
pub const DEFAULT_FILTER: &str = "meshdeck=info,meshdeck_registry=info,meshdeck_engine=info,warn";

/// Log output format, from `--log-format` or `log_format` in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact lines for interactive use.
    #[default]
    #[serde(alias = "text")]
    #[value(alias = "text")]
    Human,
    /// One JSON object per event, for `run` under a supervisor.
    Json,
}

/// `MESHDECK_LOG` wins over `RUST_LOG`. Unparseable directives fall back to
/// [`DEFAULT_FILTER`].
fn build_filter(meshdeck_log: Option<&str>, rust_log: Option<&str>) -> EnvFilter {
    meshdeck_log
        .or(rust_log)
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Events go to stderr; stdout carries only
/// command output.
pub fn init(format: LogFormat) {
    let meshdeck_log = std::env::var("MESHDECK_LOG").ok();
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(meshdeck_log.as_deref(), rust_log.as_deref());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Human => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .init(),
    }
}
