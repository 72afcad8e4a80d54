//! Command-line surface.
//!
//! The shell hands us exactly one interesting thing, the last command's
//! exit code, so the CLI is a single optional positional plus the logging
//! flags. Logging can also be configured through `PROMPTLINE_LOG_*`
//! environment variables; CLI flags take precedence.

use crate::logging::{LogConfig, LogFormat, LogLevel};
use clap::Parser;
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// Generate a git-aware, powerline-style bash prompt on stdout.
///
/// Wire it up as: PS1='$(promptline "$?")'
#[derive(Parser, Clone, Debug)]
#[command(name = "promptline", version = LONG_VERSION)]
pub struct Args {
    /// Exit code of the last command ($?), forwarded by the shell; any
    /// value other than "0" colors the status marker red
    pub last_exit: Option<String>,

    // Probing
    /// Directory to probe instead of $PWD
    #[arg(long, help_heading = "Probing")]
    pub dir: Option<PathBuf>,

    // Logging
    /// Log level (trace|debug|info|warn|error); logging is off when unset
    #[arg(long, help_heading = "Logging")]
    pub log_level: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long, help_heading = "Logging")]
    pub log_file: Option<PathBuf>,

    /// Log format (text|json)
    #[arg(long, help_heading = "Logging")]
    pub log_format: Option<String>,
}

impl Args {
    /// Resolve the logging configuration from CLI flags and
    /// `PROMPTLINE_LOG_*` environment variables (CLI wins).
    pub fn log_config(&self) -> LogConfig {
        let level = self
            .log_level
            .clone()
            .or_else(|| std::env::var("PROMPTLINE_LOG_LEVEL").ok());
        let file = self
            .log_file
            .clone()
            .or_else(|| std::env::var("PROMPTLINE_LOG_FILE").ok().map(PathBuf::from));
        let format = self
            .log_format
            .clone()
            .or_else(|| std::env::var("PROMPTLINE_LOG_FORMAT").ok());

        LogConfig {
            level: level.and_then(|s| LogLevel::parse(&s)),
            file,
            format: format.and_then(|s| LogFormat::parse(&s)).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_positional_last_exit() {
        let args = Args::parse_from(["promptline", "130"]);
        assert_eq!(args.last_exit.as_deref(), Some("130"));

        let args = Args::parse_from(["promptline"]);
        assert_eq!(args.last_exit, None);
    }

    #[test]
    #[serial]
    fn test_log_config_from_flags() {
        let args = Args::parse_from([
            "promptline",
            "--log-level",
            "debug",
            "--log-file",
            "/tmp/promptline.log",
            "--log-format",
            "json",
        ]);
        let config = args.log_config();
        assert_eq!(config.level, Some(LogLevel::Debug));
        assert_eq!(config.file, Some(PathBuf::from("/tmp/promptline.log")));
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    #[serial]
    fn test_cli_flags_beat_environment() {
        // SAFETY: test-only environment mutation, serialized across tests.
        unsafe {
            std::env::set_var("PROMPTLINE_LOG_LEVEL", "error");
            std::env::set_var("PROMPTLINE_LOG_FORMAT", "json");
        }

        let args = Args::parse_from(["promptline", "--log-level", "trace"]);
        let config = args.log_config();
        assert_eq!(config.level, Some(LogLevel::Trace));
        // Unset on the CLI, so the env value applies.
        assert_eq!(config.format, LogFormat::Json);

        unsafe {
            std::env::remove_var("PROMPTLINE_LOG_LEVEL");
            std::env::remove_var("PROMPTLINE_LOG_FORMAT");
        }
    }

    #[test]
    #[serial]
    fn test_logging_disabled_without_level() {
        let args = Args::parse_from(["promptline", "0"]);
        assert!(args.log_config().level.is_none());
    }
}
