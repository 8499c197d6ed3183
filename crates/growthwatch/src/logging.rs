//! Diagnostic logging for the growthwatch CLI.
//!
//! Command results go to stdout (often as JSON), so every diagnostic goes to
//! stderr. growthwatch's own targets follow the `-q`/`-v` flags while
//! dependency targets stay at `warn` unless full tracing is requested.

use std::io::IsTerminal;

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used for dependency targets below [`Verbosity::Trace`].
const DEPENDENCY_LEVEL: Level = Level::WARN;

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only, such as a corrupt reference store.
    Quiet,
    /// Warnings, including gaps found in the reference table.
    #[default]
    Normal,
    /// Store opens, imports and migrations.
    Verbose,
    /// Every lookup and computed bound, plus dependency internals.
    Trace,
}

impl Verbosity {
    /// Map the `--quiet` flag and the `-v` count to a verbosity.
    ///
    /// `--quiet` wins over any number of `-v`.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Trace,
        }
    }

    /// Level applied to growthwatch's own targets.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::INFO,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directives for this verbosity, in `RUST_LOG` syntax.
    #[must_use]
    pub fn filter_directives(&self) -> String {
        let own = self.to_level_filter();
        let dependencies = match self {
            Self::Trace => Level::TRACE,
            Self::Quiet => Level::ERROR,
            _ => DEPENDENCY_LEVEL,
        };
        format!("{},growthwatch={}", dependencies, own).to_lowercase()
    }
}

/// Build the filter, preferring a parseable `RUST_LOG` value over the flags.
///
/// An unparseable `RUST_LOG` falls back to the flag-derived directives rather
/// than silencing output.
fn build_filter(verbosity: Verbosity, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(verbosity.filter_directives()))
}

/// Initialize the logging system.
///
/// Call once at startup, before the config or reference store is touched.
/// Later calls are no-ops. Timestamps are omitted since each invocation is a
/// single short command; targets are shown only at [`Verbosity::Trace`].
///
/// # Examples
///
/// ```no_run
/// use growthwatch::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(false, 1));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(verbosity, rust_log.as_deref());

    let stderr = std::io::stderr();
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(stderr.is_terminal())
        .with_target(verbosity == Verbosity::Trace)
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}
