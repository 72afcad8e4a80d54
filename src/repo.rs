//! Git repository state resolution.
//!
//! This is the heart of the prompt: a fixed, strictly ordered protocol of
//! `git` subprocess probes and metadata-file reads that is fused into one
//! immutable [`RepoState`] per invocation. Every sub-probe failure degrades
//! to a neutral sentinel (no operation, `NoUpstream`, `Clean`, empty label)
//! rather than an error; the only way the resolver "fails" is by returning
//! `None` when the directory is not inside a repository or git itself is
//! unavailable.

use crate::command::{self, TrimMode};
use crate::fsprobe;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Upper bound for single-shot reads of git marker files (`head-name`,
/// `msgnum`, ...). These files hold one short line each.
const MARKER_MAX: u64 = 255;

// The fixed probe protocol. Argument vectors are spelled out once so the
// process boundary is auditable in one place.
const REV_PARSE: &[&str] = &[
    "git",
    "rev-parse",
    "--git-dir",
    "--is-inside-git-dir",
    "--is-bare-repository",
    "--is-inside-work-tree",
    "--short",
    "HEAD",
];
const DIFF: &[&str] = &["git", "diff", "--no-ext-diff", "--quiet"];
const DIFF_CACHED: &[&str] = &["git", "diff", "--no-ext-diff", "--quiet", "--cached"];
const CHECK_STASH: &[&str] = &["git", "rev-parse", "--verify", "--quiet", "refs/stash"];
const READ_HEAD: &[&str] = &["git", "symbolic-ref", "HEAD"];
const DESCRIBE: &[&str] = &["git", "describe", "--contains", "--all", "HEAD"];
const UPSTREAM: &[&str] = &[
    "git",
    "rev-list",
    "--count",
    "--left-right",
    "@{upstream}...HEAD",
];

/// An interrupted multi-step git workflow recorded via marker files in the
/// metadata directory. Variants are mutually exclusive; detection is
/// first-match by the priority order documented on [`resolve_repository_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operation {
    #[default]
    None,
    RebaseMerge,
    RebaseApply,
    /// `git am` mailbox application in progress.
    AmMailbox,
    /// `rebase-apply/` exists but carries neither a `rebasing` nor an
    /// `applying` marker, so the two cannot be told apart.
    AmOrRebase,
    Merging,
    CherryPicking,
    Reverting,
    Bisecting,
}

impl Operation {
    /// The display tag rendered after the head label, or `None` when no
    /// operation is in progress.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Operation::None => None,
            Operation::RebaseMerge | Operation::RebaseApply => Some("|REBASE"),
            Operation::AmMailbox => Some("|AM"),
            Operation::AmOrRebase => Some("|AM/REBASE"),
            Operation::Merging => Some("|MERGING"),
            Operation::CherryPicking => Some("|CHERRY-PICKING"),
            Operation::Reverting => Some("|REVERTING"),
            Operation::Bisecting => Some("|BISECTING"),
        }
    }

    /// Whether the tag may carry a step/total progress suffix. The rebase
    /// and mailbox workflows record one; the single-file markers never do.
    pub fn shows_progress(&self) -> bool {
        matches!(
            self,
            Operation::RebaseMerge
                | Operation::RebaseApply
                | Operation::AmMailbox
                | Operation::AmOrRebase
        )
    }
}

// Single-file operation markers, checked in this order after the two rebase
// directories. First match wins.
const OPERATION_MARKERS: &[(&str, Operation)] = &[
    ("MERGE_HEAD", Operation::Merging),
    ("CHERRY_PICK_HEAD", Operation::CherryPicking),
    ("REVERT_HEAD", Operation::Reverting),
    ("BISECT_LOG", Operation::Bisecting),
];

/// State of the index relative to HEAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexState {
    #[default]
    Clean,
    /// `git diff --cached --quiet` exited non-zero.
    Staged,
    /// The repository has no commits yet, so there is no HEAD to diff
    /// against. Distinct from `Clean` on purpose.
    NoCommitsYet,
}

/// Relationship between HEAD and its configured upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Divergence {
    /// No upstream configured, or the count probe failed. Renders the same
    /// as `InSync`; a documented equivalence, not an accident.
    #[default]
    NoUpstream,
    InSync,
    Ahead,
    Behind,
    Diverged,
}

impl Divergence {
    /// The arrow glyph shown in the git segment, empty for the two
    /// nothing-worth-showing cases.
    pub fn arrow(&self) -> &'static str {
        match self {
            Divergence::NoUpstream | Divergence::InSync => "",
            Divergence::Ahead => "\u{2191}",
            Divergence::Behind => "\u{2193}",
            Divergence::Diverged => "\u{2195}",
        }
    }
}

/// Immutable summary of a repository's state, built once per prompt render
/// and handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoState {
    /// The repository's metadata directory, absolute.
    pub git_dir: PathBuf,
    pub is_bare: bool,
    pub inside_git_dir: bool,
    pub inside_work_tree: bool,
    /// Branch name (with `refs/heads/` stripped), `GIT_DIR!`, or a
    /// parenthesized detached-HEAD description.
    pub head_label: String,
    /// Whether the renderer should put a `BARE:` tag before the label.
    /// Carried separately from `is_bare` so the location flags stay
    /// independently observable.
    pub bare_prefix: bool,
    pub operation: Operation,
    /// `(step, total)` when the workflow records progress marker files
    /// (the rebase and mailbox variants) and both were readable.
    pub operation_progress: Option<(String, String)>,
    pub working_tree_dirty: bool,
    pub index_state: IndexState,
    pub stash_present: bool,
    pub upstream: Divergence,
    pub detached_head: bool,
}

impl RepoState {
    /// True when the repository deserves the attention color: detached
    /// HEAD, uncommitted or staged changes, or stash entries. Stash alone
    /// flipping the color is intentional.
    pub fn needs_attention(&self) -> bool {
        self.detached_head
            || self.working_tree_dirty
            || self.index_state != IndexState::Clean
            || self.stash_present
    }
}

/// What operation detection learned from the metadata directory.
#[derive(Debug, Default)]
struct OperationInfo {
    operation: Operation,
    progress: Option<(String, String)>,
    head_label: Option<String>,
}

/// Resolve the repository state for `working_dir`.
///
/// Returns `None` when the directory is not inside git-managed metadata or
/// the `git` executable cannot be run; in that case no subprocess beyond
/// the initial location probe is launched. The resolution is strictly
/// sequential and recomputed from scratch on every call.
pub fn resolve_repository_state(working_dir: &Path) -> Option<RepoState> {
    // Step 1: locate the repository. An empty --git-dir line short-circuits
    // everything else.
    let located = command::run(REV_PARSE, working_dir, TrimMode::None).ok()?;
    let mut lines = located.stdout.lines();
    let git_dir_raw = lines.next().unwrap_or("");
    if git_dir_raw.is_empty() {
        return None;
    }
    let inside_git_dir = lines.next() == Some("true");
    let is_bare = lines.next() == Some("true");
    let inside_work_tree = lines.next() == Some("true");
    // The short-hash line only exists when the whole query succeeded; its
    // absence specifically means the repository has no commits yet.
    let short_hash = if located.success() {
        lines.next().map(str::to_string)
    } else {
        None
    };

    let git_dir = {
        let raw = Path::new(git_dir_raw);
        if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            working_dir.join(raw)
        }
    };
    debug!(git_dir = %git_dir.display(), inside_git_dir, is_bare, inside_work_tree, "repository located");

    // Step 2: operation in progress, strict first-match priority.
    let op = detect_operation(&git_dir);

    // Step 3: head label, unless an operation branch already supplied one.
    let mut detached_head = false;
    let mut head_label = match op.head_label {
        Some(label) => label,
        None => resolve_head_label(&git_dir, working_dir, short_hash.as_deref(), &mut detached_head),
    };
    if let Some(stripped) = head_label.strip_prefix("refs/heads/") {
        head_label = stripped.to_string();
    }

    let mut state = RepoState {
        git_dir,
        is_bare,
        inside_git_dir,
        inside_work_tree,
        head_label,
        bare_prefix: false,
        operation: op.operation,
        operation_progress: op.progress,
        working_tree_dirty: false,
        index_state: IndexState::Clean,
        stash_present: false,
        upstream: Divergence::NoUpstream,
        detached_head,
    };

    // Step 5: container overrides. Inside the metadata directory itself no
    // work-tree comparison is meaningful.
    if inside_git_dir {
        if is_bare {
            state.bare_prefix = true;
        } else {
            state.head_label = "GIT_DIR!".to_string();
        }
        return Some(state);
    }

    // Step 6: work-tree probes.
    if inside_work_tree {
        state.working_tree_dirty = command::run(DIFF, working_dir, TrimMode::None)
            .map(|c| !c.success())
            .unwrap_or(false);

        let staged = command::run(DIFF_CACHED, working_dir, TrimMode::None)
            .map(|c| !c.success())
            .unwrap_or(false);
        state.index_state = if staged {
            IndexState::Staged
        } else if short_hash.is_none() {
            IndexState::NoCommitsYet
        } else {
            IndexState::Clean
        };

        state.stash_present = command::succeeds(CHECK_STASH, working_dir);

        state.upstream = match command::run(UPSTREAM, working_dir, TrimMode::One) {
            Ok(captured) if captured.success() => parse_divergence(&captured.stdout),
            _ => Divergence::NoUpstream,
        };
    }

    Some(state)
}

/// Detect an operation in progress from marker files under `git_dir`.
///
/// Priority: `rebase-merge/` beats `rebase-apply/` beats the single-file
/// markers in [`OPERATION_MARKERS`] order.
fn detect_operation(git_dir: &Path) -> OperationInfo {
    let mut info = OperationInfo::default();

    if fsprobe::is_dir(&git_dir.join("rebase-merge")) {
        info.operation = Operation::RebaseMerge;
        info.head_label = non_empty(fsprobe::read_trimmed(
            &git_dir.join("rebase-merge/head-name"),
            MARKER_MAX,
        ));
        info.progress = read_progress(git_dir, "rebase-merge/msgnum", "rebase-merge/end");
        return info;
    }

    if fsprobe::is_dir(&git_dir.join("rebase-apply")) {
        info.progress = read_progress(git_dir, "rebase-apply/next", "rebase-apply/last");
        if fsprobe::is_file(&git_dir.join("rebase-apply/rebasing")) {
            info.operation = Operation::RebaseApply;
            info.head_label = non_empty(fsprobe::read_trimmed(
                &git_dir.join("rebase-apply/head-name"),
                MARKER_MAX,
            ));
        } else if fsprobe::is_file(&git_dir.join("rebase-apply/applying")) {
            info.operation = Operation::AmMailbox;
        } else {
            info.operation = Operation::AmOrRebase;
        }
        return info;
    }

    for (marker, operation) in OPERATION_MARKERS {
        if fsprobe::is_file(&git_dir.join(marker)) {
            info.operation = *operation;
            return info;
        }
    }

    info
}

/// Read a `(step, total)` progress pair; present only when both marker
/// files were readable and non-empty.
fn read_progress(git_dir: &Path, step_file: &str, total_file: &str) -> Option<(String, String)> {
    let step = fsprobe::read_trimmed(&git_dir.join(step_file), MARKER_MAX);
    let total = fsprobe::read_trimmed(&git_dir.join(total_file), MARKER_MAX);
    if step.is_empty() || total.is_empty() {
        return None;
    }
    Some((step, total))
}

/// Resolve where HEAD points when no in-progress operation recorded it.
///
/// A symlinked `HEAD` goes through `git symbolic-ref`; a regular `HEAD`
/// starting with `ref: ` names a branch directly; anything else is a
/// detached checkout described by `git describe --contains --all`, falling
/// back to `(<short-hash>...)`.
fn resolve_head_label(
    git_dir: &Path,
    working_dir: &Path,
    short_hash: Option<&str>,
    detached_head: &mut bool,
) -> String {
    let head_path = git_dir.join("HEAD");

    if fsprobe::is_symlink(&head_path) {
        return match command::run(READ_HEAD, working_dir, TrimMode::One) {
            Ok(captured) if captured.success() => captured.stdout,
            _ => String::new(),
        };
    }

    let head = fsprobe::read_trimmed(&head_path, MARKER_MAX);
    if let Some(reference) = head.strip_prefix("ref: ") {
        return reference.to_string();
    }

    *detached_head = true;
    match command::run(DESCRIBE, working_dir, TrimMode::One) {
        Ok(captured) if captured.success() => format!("({})", captured.stdout),
        _ => format!("({}...)", short_hash.unwrap_or("")),
    }
}

/// Parse the `behind\tahead` counts of
/// `git rev-list --count --left-right @{upstream}...HEAD`.
pub fn parse_divergence(counts: &str) -> Divergence {
    let mut parts = counts.split('\t');
    let behind = parts.next().unwrap_or("");
    let ahead = parts.next().unwrap_or("");
    match (behind, ahead) {
        ("0", "0") => Divergence::InSync,
        ("0", _) => Divergence::Ahead,
        (_, "0") => Divergence::Behind,
        _ => Divergence::Diverged,
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
