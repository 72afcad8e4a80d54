//! Filesystem probes for git metadata files.
//!
//! Every helper here is deliberately infallible: the prompt must render
//! something on every invocation, so a missing file, a permission error, or
//! a dangling symlink all fold into `false` / empty string instead of
//! propagating. Callers that need to distinguish "absent" from "empty" do
//! not exist in this crate.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::trace;

/// Non-following check: does `path` name a directory?
pub fn is_dir(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_dir())
        .unwrap_or(false)
}

/// Non-following check: does `path` name a regular file?
pub fn is_file(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_file())
        .unwrap_or(false)
}

/// Non-following check: is `path` itself a symbolic link?
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Read up to `max_bytes` of `path` in a single pass.
///
/// Trims exactly one trailing newline when the content is non-empty, which
/// matches the single-line marker files git writes (`head-name`, `msgnum`,
/// `MERGE_HEAD`, ...). Returns an empty string on any failure to open or
/// read; content past `max_bytes` is silently dropped.
pub fn read_trimmed(path: &Path, max_bytes: u64) -> String {
    let Ok(file) = File::open(path) else {
        trace!(path = %path.display(), "file probe missed");
        return String::new();
    };

    let mut content = String::new();
    if file.take(max_bytes).read_to_string(&mut content).is_err() {
        return String::new();
    }

    if content.ends_with('\n') {
        content.pop();
    }
    content
}
