//! Opt-in tracing subscriber for analyzer debugging.
//!
//! Nothing is installed unless `TYREL_LOG` or `RUST_LOG` is set. The filter
//! is taken from `TYREL_LOG` when present, else from `RUST_LOG`. The layout
//! comes from `TYREL_LOG_FORMAT`:
//!
//! | value  | output |
//! |--------|--------|
//! | `text` | flat `fmt` lines (default, also for unknown values) |
//! | `tree` | indented spans via `tracing-tree` |
//! | `json` | one JSON object per event |
//!
//! ```bash
//! TYREL_LOG=tyrel_solver=debug TYREL_LOG_FORMAT=tree cargo test -p tyrel-solver
//! TYREL_LOG=tyrel::query_json=trace TYREL_LOG_FORMAT=json cargo test
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Tree,
    Json,
}

impl LogFormat {
    /// Case-insensitive; anything unrecognised is `Text`.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("tree") {
            Self::Tree
        } else if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

fn env_filter() -> Option<EnvFilter> {
    match std::env::var("TYREL_LOG") {
        Ok(directives) => Some(EnvFilter::builder().parse_lossy(directives)),
        Err(_) if std::env::var_os("RUST_LOG").is_some() => Some(EnvFilter::from_default_env()),
        Err(_) => None,
    }
}

/// Install the global subscriber, writing to stderr.
///
/// Calling it again (or after another subscriber was installed, as happens
/// with parallel tests) leaves the existing subscriber in place.
pub fn init_tracing() {
    let Some(filter) = env_filter() else {
        return;
    };
    let format = LogFormat::parse(&std::env::var("TYREL_LOG_FORMAT").unwrap_or_default());
    let registry = Registry::default().with(filter);

    let installed = match format {
        LogFormat::Tree => registry
            .with(
                tracing_tree::HierarchicalLayer::default()
                    .with_writer(std::io::stderr)
                    .with_indent_amount(2)
                    .with_indent_lines(true)
                    .with_targets(true),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!(?format, "init_tracing: subscriber already installed");
    }
}

#[cfg(test)]
#[path = "../tests/tracing_config_tests.rs"]
mod tests;
