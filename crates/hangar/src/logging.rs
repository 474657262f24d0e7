//! Subscriber setup for the `hangar` binary.
//!
//! Events go to stderr; stdout carries the JSON that commands print.

use std::io::IsTerminal;
use std::str::FromStr;

use hangar_core::config::LoggingConfig;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// Per-statement sqlx events are noise unless someone is debugging the store.
const QUIET_TARGETS: &[&str] = &["sqlx"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

/// `[logging]` merged with the command-line overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    level: LevelFilter,
    format: LogFormat,
}

impl LogSettings {
    /// `--verbose` raises the level to at least debug; `--json-logs` forces JSON.
    ///
    /// An unrecognized level falls back to info with a warning on stderr,
    /// since the subscriber does not exist yet.
    fn resolve(config: &LoggingConfig, verbose: bool, json_logs: bool) -> Self {
        let configured = LevelFilter::from_str(config.level.trim()).unwrap_or_else(|_| {
            eprintln!(
                "Warning: unknown log level {:?} in config, using info",
                config.level
            );
            LevelFilter::INFO
        });
        let level = if verbose {
            configured.max(LevelFilter::DEBUG)
        } else {
            configured
        };

        let format = if json_logs || config.format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };

        Self { level, format }
    }

    /// Filter directives used when `RUST_LOG` is unset.
    fn directives(&self) -> String {
        let level = self.level.to_string().to_ascii_lowercase();
        let mut directives = vec![level];
        if self.level == LevelFilter::INFO {
            directives.extend(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")));
        }
        directives.join(",")
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directives()))
    }
}

/// Install the global subscriber from `[logging]` and the CLI flags.
///
/// `RUST_LOG`, when set, replaces the configured level entirely.
pub fn init_from_config(config: &hangar_core::Config, verbose: bool, json_logs: bool) {
    let settings = LogSettings::resolve(&config.logging, verbose, json_logs);
    let registry = tracing_subscriber::registry().with(settings.filter());

    match settings.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(std::io::stderr().is_terminal()),
            )
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logging(level: &str, format: &str) -> LoggingConfig {
        LoggingConfig {
            level: level.to_string(),
            format: format.to_string(),
        }
    }

    #[test]
    fn test_configured_level_is_used() {
        let settings = LogSettings::resolve(&logging("warn", "pretty"), false, false);
        assert_eq!(settings.level, LevelFilter::WARN);
        assert_eq!(settings.directives(), "warn");

        let filter = EnvFilter::new(settings.directives());
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_default_level_quiets_sqlx() {
        let settings = LogSettings::resolve(&LoggingConfig::default(), false, false);
        assert_eq!(settings.directives(), "info,sqlx=warn");
    }

    #[test]
    fn test_level_is_case_insensitive() {
        let settings = LogSettings::resolve(&logging(" ERROR ", "pretty"), false, false);
        assert_eq!(settings.level, LevelFilter::ERROR);
    }

    #[test]
    fn test_verbose_raises_to_debug() {
        let settings = LogSettings::resolve(&logging("warn", "pretty"), true, false);
        assert_eq!(settings.level, LevelFilter::DEBUG);
        assert_eq!(settings.directives(), "debug");
    }

    #[test]
    fn test_verbose_keeps_trace() {
        let settings = LogSettings::resolve(&logging("trace", "pretty"), true, false);
        assert_eq!(settings.level, LevelFilter::TRACE);
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let settings = LogSettings::resolve(&logging("loud", "pretty"), false, false);
        assert_eq!(settings.level, LevelFilter::INFO);
    }

    #[test]
    fn test_json_from_config_or_flag() {
        let from_config = LogSettings::resolve(&logging("info", "JSON"), false, false);
        assert_eq!(from_config.format, LogFormat::Json);

        let from_flag = LogSettings::resolve(&logging("info", "pretty"), false, true);
        assert_eq!(from_flag.format, LogFormat::Json);

        let default = LogSettings::resolve(&LoggingConfig::default(), false, false);
        assert_eq!(default.format, LogFormat::Pretty);
    }
}
