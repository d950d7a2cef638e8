//! Subscriber setup for hosts that embed kiln without one of their own.
//!
//! Enabled by the `logging` feature. Library code only emits `tracing`
//! events: traversal steps at `debug`, computed deltas at `info`, recovered
//! failures at `warn`.

use std::str::FromStr;
use std::sync::Once;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Lowest severity that reaches the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    #[default]
    Info,
    /// Includes one event per traversed module.
    Debug,
}

/// Accepted spellings, matched case-insensitively.
const NAMES: [(&str, LogLevel); 7] = [
    ("silent", LogLevel::Silent),
    ("off", LogLevel::Silent),
    ("error", LogLevel::Error),
    ("warn", LogLevel::Warn),
    ("warning", LogLevel::Warn),
    ("info", LogLevel::Info),
    ("debug", LogLevel::Debug),
];

/// A log level name that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level `{0}`, expected one of silent, error, warn, info, debug")]
pub struct UnknownLogLevel(pub String);

impl LogLevel {
    /// Name understood by `RUST_LOG`.
    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Silent => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
        }
    }
}

impl FromStr for LogLevel {
    type Err = UnknownLogLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s.trim()))
            .map(|(_, level)| *level)
            .ok_or_else(|| UnknownLogLevel(s.to_string()))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Log to stderr at `level`, refined by any `RUST_LOG` directives.
///
/// Later calls in the same process do nothing, as does a call made after the
/// host installed its own global subscriber.
///
/// ```rust,no_run
/// use kiln_bundler::logging::{LogLevel, init_logging};
///
/// init_logging(LogLevel::Debug);
/// ```
pub fn init_logging(level: LogLevel) {
    INIT.call_once(|| {
        install(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from(level).into())
                .from_env_lossy(),
        );
    });
}

/// Log to stderr as configured by `RUST_LOG`, or at `info` without it.
pub fn init_logging_from_env() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::INFO.into()));
        install(filter);
    });
}

fn install(filter: EnvFilter) {
    // Timestamps are left to whoever collects stderr.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).without_time())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_spelling_parses_back_to_its_level() {
        for (name, level) in NAMES {
            assert_eq!(name.parse::<LogLevel>(), Ok(level));
            assert_eq!(name.to_uppercase().parse::<LogLevel>(), Ok(level));
        }
        assert_eq!(" debug ".parse::<LogLevel>(), Ok(LogLevel::Debug));
    }

    #[test]
    fn test_unknown_level_names_the_input() {
        let err = "verbose".parse::<LogLevel>().unwrap_err();
        assert_eq!(err, UnknownLogLevel("verbose".to_string()));
        assert!(err.to_string().contains("`verbose`"));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for level in [LogLevel::Silent, LogLevel::Warn, LogLevel::Debug] {
            assert_eq!(level.to_string().parse::<LogLevel>(), Ok(level));
        }
    }

    #[test]
    fn test_levels_map_onto_tracing_filters() {
        assert!(LogLevel::Silent < LogLevel::Debug);
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LevelFilter::from(LogLevel::Silent), LevelFilter::OFF);
        assert_eq!(LevelFilter::from(LogLevel::Warn), LevelFilter::WARN);
    }
}
