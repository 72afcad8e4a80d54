//! Unified error handling for the promptline library.
//!
//! The prompt renderer itself is fail-open: a probe that cannot run is a
//! neutral sentinel, never an error. The types here cover the two places
//! where an error is still meaningful, launching a child process and
//! writing the finished prompt, using `thiserror` so callers can match on
//! them.

use std::io;
use thiserror::Error;

/// The main error type for the promptline binary.
#[derive(Error, Debug)]
pub enum PromptError {
    /// A child process could not be launched.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Writing the rendered prompt to stdout failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors that can occur when running an external command.
///
/// A command that launches but exits non-zero (or dies to a signal) is not
/// an error at this layer; it is reported through the captured exit code.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The executable could not be spawned at all (typically not installed
    /// or not on `PATH`).
    #[error("Failed to launch '{command}': {source}")]
    Launch {
        /// The executable that failed to launch.
        command: String,
        /// The underlying spawn error.
        source: io::Error,
    },
}

impl CommandError {
    /// The executable name the failure relates to.
    pub fn command(&self) -> &str {
        match self {
            CommandError::Launch { command, .. } => command,
        }
    }
}

/// Type alias for Results using PromptError.
pub type PromptResult<T> = std::result::Result<T, PromptError>;

#[cfg(test)]
mod tests {
    use super::*;

    /// # Command Error Display
    ///
    /// Tests that command errors name the failing executable.
    ///
    /// ## Expected Outcome
    /// - Launch failures mention the command and the OS error
    #[test]
    fn test_command_error_display() {
        let err = CommandError::Launch {
            command: "git".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        let msg = err.to_string();
        assert!(msg.contains("git"));
        assert!(msg.contains("No such file"));
        assert_eq!(err.command(), "git");
    }

    /// # Error Conversion
    ///
    /// Tests that errors convert correctly through the From trait.
    #[test]
    fn test_error_conversion() {
        let cmd_err = CommandError::Launch {
            command: "git".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        let prompt_err: PromptError = cmd_err.into();
        assert!(matches!(prompt_err, PromptError::Command(_)));

        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe");
        let prompt_err: PromptError = io_err.into();
        assert!(matches!(prompt_err, PromptError::Io(_)));
    }
}
