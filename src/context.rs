//! Environment context for one prompt render.
//!
//! Everything outside the git metadata (user, host, working directory,
//! virtualenv, SSH) comes from the process environment and `uname`, read
//! once into an immutable [`PromptContext`]. Like the repository resolver,
//! gathering is fail-open: a missing variable produces an empty or absent
//! field, never an error.

use std::env;
use std::ffi::CString;
use std::path::{Path, PathBuf};

/// Raw environment inputs, split out so tests can feed values without
/// mutating the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    pub user: Option<String>,
    pub pwd: Option<String>,
    pub home: Option<String>,
    pub virtual_env: Option<String>,
    pub ssh_client: Option<String>,
}

impl EnvSnapshot {
    /// Capture the live process environment. `HOME` resolution goes through
    /// `dirs` first so it behaves on setups where `$HOME` is unset.
    pub fn capture() -> Self {
        EnvSnapshot {
            user: env::var("USER").ok(),
            pwd: env::var("PWD").ok(),
            home: dirs::home_dir()
                .map(|p| p.to_string_lossy().into_owned())
                .or_else(|| env::var("HOME").ok()),
            virtual_env: env::var("VIRTUAL_ENV").ok(),
            ssh_client: env::var("SSH_CLIENT").ok(),
        }
    }
}

/// Context fields consumed by the renderer. Built once per invocation.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub user: String,
    pub host: String,
    /// Logical working directory (`$PWD`, preserving symlinks), also the
    /// default directory the repository resolver probes.
    pub probe_dir: PathBuf,
    /// `$PWD` with the home prefix replaced by `~`.
    pub display_path: String,
    /// Whether the working directory is writable by the invoking user.
    pub writable: bool,
    /// Basename of `$VIRTUAL_ENV`, when one is active.
    pub venv: Option<String>,
    /// True inside an SSH session.
    pub ssh: bool,
    /// True when the exit code handed in by the shell was non-zero.
    pub last_command_failed: bool,
}

impl PromptContext {
    /// Build a context from the live environment. `last_exit` is the
    /// shell's `$?`, passed through as text; anything other than `"0"`
    /// counts as a failure, and no argument counts as success.
    pub fn from_env(last_exit: Option<&str>) -> Self {
        Self::from_snapshot(EnvSnapshot::capture(), hostname(), last_exit)
    }

    /// Deterministic constructor used by [`PromptContext::from_env`] and by
    /// tests.
    pub fn from_snapshot(env: EnvSnapshot, host: String, last_exit: Option<&str>) -> Self {
        let pwd = env
            .pwd
            .or_else(|| {
                std::env::current_dir()
                    .ok()
                    .map(|p| p.to_string_lossy().into_owned())
            })
            .unwrap_or_default();

        let display_path = match &env.home {
            Some(home) if !home.is_empty() && pwd.starts_with(home.as_str()) => {
                format!("~{}", &pwd[home.len()..])
            }
            _ => pwd.clone(),
        };

        let venv = env
            .virtual_env
            .as_deref()
            .and_then(|v| Path::new(v).file_name())
            .map(|name| name.to_string_lossy().into_owned());

        PromptContext {
            user: env.user.unwrap_or_default(),
            host,
            writable: is_writable(&pwd),
            probe_dir: PathBuf::from(pwd),
            display_path,
            venv,
            ssh: env.ssh_client.is_some(),
            last_command_failed: last_exit.is_some_and(|code| code != "0"),
        }
    }
}

/// The machine's nodename from `uname(2)`, empty on failure.
pub fn hostname() -> String {
    let mut name: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut name) } != 0 {
        return String::new();
    }
    let bytes: Vec<u8> = name
        .nodename
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// `access(2)` check with `W_OK`; false for paths that cannot be encoded
/// or do not exist.
pub fn is_writable(path: &str) -> bool {
    let Ok(cpath) = CString::new(path) else {
        return false;
    };
    unsafe { libc::access(cpath.as_ptr(), libc::W_OK) == 0 }
}

/// Tail-truncate a display path to its final component.
///
/// Mirrors the prompt's historical behavior: paths shorter than two bytes
/// are kept whole, and the scan starts one byte before the end so a
/// trailing slash stays attached to its component ("foo/" stays "foo/",
/// "/a" stays "/a", "~" stays "~").
pub fn shorten_path(dir: &str) -> &str {
    let bytes = dir.as_bytes();
    if bytes.len() < 2 {
        return dir;
    }
    let mut start = bytes.len() - 2;
    while start > 0 && bytes[start - 1] != b'/' {
        start -= 1;
    }
    &dir[start..]
}
