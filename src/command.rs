//! Synchronous subprocess execution with bounded stdout capture.
//!
//! Every git probe the resolver performs goes through [`run`]. The contract
//! is deliberately narrow: stdout is captured into an owned string capped at
//! [`MAX_CAPTURE`] bytes, stderr is discarded, and the call blocks until the
//! child exits. There is no timeout; a wedged child wedges the prompt
//! render, which is the documented trade-off of a one-shot tool.

use crate::error::CommandError;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Maximum number of bytes of child stdout retained per invocation.
///
/// Output past this point is dropped without signalling the caller; every
/// probe in this crate expects at most a handful of short lines.
pub const MAX_CAPTURE: usize = 64 * 1024;

/// Exit code reported when the child was killed by a signal rather than
/// exiting on its own.
pub const SIGNALED: i32 = -1;

/// Whether to strip one trailing newline from the captured output.
///
/// Single-line queries (a commit hash, a ref name, a rev-list count) are
/// captured with [`TrimMode::One`] so the caller gets the bare value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimMode {
    /// Keep the capture exactly as the child wrote it.
    None,
    /// Strip exactly one trailing `\n`, if present.
    One,
}

/// The outcome of a successfully launched command.
#[derive(Debug, Clone)]
pub struct Captured {
    /// The child's exit code, or [`SIGNALED`] for a signaled death.
    pub code: i32,
    /// Captured stdout, lossily decoded, capped at [`MAX_CAPTURE`].
    pub stdout: String,
}

impl Captured {
    /// True when the child exited with status 0.
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Run `argv` in `cwd`, capturing stdout and discarding stderr.
///
/// Returns `Err` only when the child could not be launched; a non-zero exit
/// is a normal `Ok` outcome carried in [`Captured::code`]. Callers in the
/// resolver treat both as "this probe is unavailable", but tests
/// distinguish them.
pub fn run(argv: &[&str], cwd: &Path, trim: TrimMode) -> Result<Captured, CommandError> {
    let (program, args) = argv
        .split_first()
        .expect("command argv must not be empty");

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|source| CommandError::Launch {
            command: (*program).to_string(),
            source,
        })?;

    let mut bytes = output.stdout;
    if bytes.len() > MAX_CAPTURE {
        warn!(
            command = program,
            captured = bytes.len(),
            cap = MAX_CAPTURE,
            "child output truncated"
        );
        bytes.truncate(MAX_CAPTURE);
    }

    let mut stdout = String::from_utf8_lossy(&bytes).into_owned();
    if trim == TrimMode::One && stdout.ends_with('\n') {
        stdout.pop();
    }

    let code = output.status.code().unwrap_or(SIGNALED);
    debug!(command = program, code, "command finished");

    Ok(Captured { code, stdout })
}

/// Convenience wrapper: run `argv` and report only whether it exited 0.
///
/// Launch failure counts as "did not succeed", matching the resolver's
/// fail-open handling of quiet probes (`git diff --quiet`, stash checks).
pub fn succeeds(argv: &[&str], cwd: &Path) -> bool {
    run(argv, cwd, TrimMode::None)
        .map(|captured| captured.success())
        .unwrap_or(false)
}
