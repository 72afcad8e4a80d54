//! Prompt segment rendering.
//!
//! Produces the final PS1 string: a terminal-title escape followed by
//! powerline-style colored segments. Two append modes matter here. `raw`
//! fragments carry escape sequences and the `\[`/`\]` readline guards;
//! `text` fragments are user-controlled values (paths, branch names) that
//! get `$` and `\` escaped so bash prompt expansion cannot reinterpret
//! them.

use crate::context::{PromptContext, shorten_path};
use crate::repo::{IndexState, RepoState};

/// 256-color palette, one `(fg, bg)` pair per segment.
mod palette {
    pub const USER_HOST: (&str, &str) = ("253", "242");
    pub const SSH: (&str, &str) = ("254", "172");
    pub const CWD: (&str, &str) = ("15", "32");
    pub const READ_ONLY: (&str, &str) = ("254", "127");
    pub const VENV: (&str, &str) = ("0", "2");
    pub const GIT_CLEAN: (&str, &str) = ("0", "148");
    pub const GIT_ATTENTION: (&str, &str) = ("15", "125");
    pub const STATUS_OK: (&str, &str) = ("40", "0");
    pub const STATUS_ERR: (&str, &str) = ("160", "0");
}

/// Powerline "hard divider" between segments.
const SEPARATOR: &str = "\u{e0b0}";
/// Padlock glyph for unwritable directories.
const READ_ONLY_GLYPH: &str = "\u{e0a2}";
const SSH_GLYPH: &str = "\u{26a1}";
const VENV_GLYPH: &str = "\u{1f40d}";

/// Owned, growable prompt assembly buffer.
///
/// Tracks the previous segment's background so each `section` call can
/// paint the powerline separator in the right colors. Fragments are passed
/// as ordered slices, keeping fragment count explicit.
#[derive(Debug, Default)]
pub struct PromptBuffer {
    out: String,
    last_bg: Option<&'static str>,
}

impl PromptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append fragments verbatim.
    pub fn raw(&mut self, fragments: &[&str]) {
        for fragment in fragments {
            self.out.push_str(fragment);
        }
    }

    /// Append a value with PS1 escaping: `$` and `\` are prefixed with a
    /// backslash so prompt expansion leaves them alone.
    pub fn text(&mut self, value: &str) {
        for c in value.chars() {
            if c == '$' || c == '\\' {
                self.out.push('\\');
            }
            self.out.push(c);
        }
    }

    /// Start a new colored segment. The first section sets colors only;
    /// every later one closes the previous segment with a separator drawn
    /// in the old background over the new one.
    pub fn section(&mut self, (fg, bg): (&'static str, &'static str)) {
        match self.last_bg {
            Some(last) => self.raw(&[
                " ",
                "\\[\x1b[38;5;",
                last,
                "m\x1b[48;5;",
                bg,
                "m\\]",
                SEPARATOR,
                " ",
                "\\[\x1b[38;5;",
                fg,
                "m\\]",
            ]),
            None => self.raw(&["\\[\x1b[38;5;", fg, "m\x1b[48;5;", bg, "m\\]"]),
        }
        self.last_bg = Some(bg);
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Render the complete prompt line for one invocation.
pub fn render_prompt(ctx: &PromptContext, repo: Option<&RepoState>) -> String {
    let mut buf = PromptBuffer::new();

    title_section(&mut buf, ctx);
    user_host_section(&mut buf, ctx);
    ssh_section(&mut buf, ctx);
    cwd_section(&mut buf, ctx);
    access_section(&mut buf, ctx);
    venv_section(&mut buf, ctx);
    if let Some(state) = repo {
        git_section(&mut buf, state);
    }
    status_section(&mut buf, ctx);

    // Reset colors; trailing space separates the prompt from input.
    buf.raw(&["\\[\x1b[m\\] "]);
    buf.finish()
}

/// Terminal window title: `user@host:path`.
fn title_section(buf: &mut PromptBuffer, ctx: &PromptContext) {
    buf.raw(&["\\[\x1b]0;"]);
    buf.text(&ctx.user);
    buf.text("@");
    buf.text(&ctx.host);
    buf.text(":");
    buf.text(&ctx.display_path);
    buf.raw(&["\x07\\]"]);
}

fn user_host_section(buf: &mut PromptBuffer, ctx: &PromptContext) {
    buf.section(palette::USER_HOST);
    buf.text(&ctx.user);
    buf.text("@");
    buf.text(&ctx.host);
}

fn ssh_section(buf: &mut PromptBuffer, ctx: &PromptContext) {
    if ctx.ssh {
        buf.section(palette::SSH);
        buf.text(SSH_GLYPH);
    }
}

fn cwd_section(buf: &mut PromptBuffer, ctx: &PromptContext) {
    buf.section(palette::CWD);
    buf.text(shorten_path(&ctx.display_path));
}

fn access_section(buf: &mut PromptBuffer, ctx: &PromptContext) {
    if !ctx.writable {
        buf.section(palette::READ_ONLY);
        buf.text(READ_ONLY_GLYPH);
    }
}

fn venv_section(buf: &mut PromptBuffer, ctx: &PromptContext) {
    if let Some(venv) = &ctx.venv {
        buf.section(palette::VENV);
        buf.text(VENV_GLYPH);
        buf.text(venv);
    }
}

fn git_section(buf: &mut PromptBuffer, state: &RepoState) {
    let colors = if state.needs_attention() {
        palette::GIT_ATTENTION
    } else {
        palette::GIT_CLEAN
    };
    buf.section(colors);
    buf.text(&git_segment_text(state));
}

/// The `$` at the end of the line, green normally and red after a failed
/// command.
fn status_section(buf: &mut PromptBuffer, ctx: &PromptContext) {
    let colors = if ctx.last_command_failed {
        palette::STATUS_ERR
    } else {
        palette::STATUS_OK
    };
    buf.section(colors);
    buf.text("$");
}

/// Plain-text body of the git segment:
/// `[BARE:]label[ *+#$][|OP[ step/total]][arrow]`.
pub fn git_segment_text(state: &RepoState) -> String {
    let mut text = String::new();

    if state.bare_prefix {
        text.push_str("BARE:");
    }
    text.push_str(&state.head_label);

    let mut flags = String::new();
    if state.working_tree_dirty {
        flags.push('*');
    }
    match state.index_state {
        IndexState::Staged => flags.push('+'),
        IndexState::NoCommitsYet => flags.push('#'),
        IndexState::Clean => {}
    }
    if state.stash_present {
        flags.push('$');
    }
    if !flags.is_empty() {
        text.push(' ');
        text.push_str(&flags);
    }

    if let Some(tag) = state.operation.tag() {
        text.push_str(tag);
        if state.operation.shows_progress() {
            if let Some((step, total)) = &state.operation_progress {
                text.push(' ');
                text.push_str(step);
                text.push('/');
                text.push_str(total);
            }
        }
    }

    text.push_str(state.upstream.arrow());
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EnvSnapshot;
    use crate::repo::{Divergence, Operation};
    use std::path::PathBuf;

    fn test_context() -> PromptContext {
        let env = EnvSnapshot {
            user: Some("alice".to_string()),
            pwd: Some("/home/alice/projects/promptline".to_string()),
            home: Some("/home/alice".to_string()),
            virtual_env: None,
            ssh_client: None,
        };
        let mut ctx = PromptContext::from_snapshot(env, "box".to_string(), Some("0"));
        // Deterministic regardless of where the tests run.
        ctx.writable = true;
        ctx
    }

    fn test_state() -> RepoState {
        RepoState {
            git_dir: PathBuf::from("/home/alice/projects/promptline/.git"),
            is_bare: false,
            inside_git_dir: false,
            inside_work_tree: true,
            head_label: "main".to_string(),
            bare_prefix: false,
            operation: Operation::None,
            operation_progress: None,
            working_tree_dirty: false,
            index_state: IndexState::Clean,
            stash_present: false,
            upstream: Divergence::NoUpstream,
            detached_head: false,
        }
    }

    #[test]
    fn test_escaping_in_text_fragments() {
        let mut buf = PromptBuffer::new();
        buf.text("a$b\\c");
        assert_eq!(buf.finish(), "a\\$b\\\\c");
    }

    #[test]
    fn test_raw_fragments_are_not_escaped() {
        let mut buf = PromptBuffer::new();
        buf.raw(&["$", "\\"]);
        assert_eq!(buf.finish(), "$\\");
    }

    #[test]
    fn test_first_section_has_no_separator() {
        let mut buf = PromptBuffer::new();
        buf.section(palette::USER_HOST);
        let out = buf.finish();
        assert!(!out.contains(SEPARATOR));
        assert!(out.contains("38;5;253"));
        assert!(out.contains("48;5;242"));
    }

    #[test]
    fn test_second_section_separator_uses_previous_background() {
        let mut buf = PromptBuffer::new();
        buf.section(palette::USER_HOST);
        buf.section(palette::CWD);
        let out = buf.finish();
        assert_eq!(out.matches(SEPARATOR).count(), 1);
        // The divider is drawn with the old background (242) as foreground
        // over the new background (32).
        assert!(out.contains("\x1b[38;5;242m\x1b[48;5;32m"));
    }

    #[test]
    fn test_prompt_contains_expected_segments() {
        let ctx = test_context();
        let out = render_prompt(&ctx, Some(&test_state()));

        assert!(out.starts_with("\\[\x1b]0;"));
        assert!(out.contains("alice@box"));
        assert!(out.contains("promptline"));
        assert!(out.contains("main"));
        assert!(out.contains("\\$"));
        assert!(out.ends_with("\\[\x1b[m\\] "));
        // Not in an SSH session, writable directory, no venv.
        assert!(!out.contains(SSH_GLYPH));
        assert!(!out.contains(READ_ONLY_GLYPH));
        assert!(!out.contains(VENV_GLYPH));
    }

    #[test]
    fn test_prompt_without_repository_has_no_git_segment() {
        let ctx = test_context();
        let out = render_prompt(&ctx, None);
        assert!(!out.contains("148"));
        assert!(!out.contains("main"));
    }

    #[test]
    fn test_status_color_tracks_exit_code() {
        let mut ctx = test_context();
        let ok = render_prompt(&ctx, None);
        assert!(ok.contains("38;5;40"));
        assert!(!ok.contains("38;5;160"));

        ctx.last_command_failed = true;
        let failed = render_prompt(&ctx, None);
        assert!(failed.contains("38;5;160"));
    }

    #[test]
    fn test_optional_segments_appear_when_set() {
        let mut ctx = test_context();
        ctx.ssh = true;
        ctx.writable = false;
        ctx.venv = Some("data-tools".to_string());
        let out = render_prompt(&ctx, None);
        assert!(out.contains(SSH_GLYPH));
        assert!(out.contains(READ_ONLY_GLYPH));
        assert!(out.contains(VENV_GLYPH));
        assert!(out.contains("data-tools"));
    }

    #[test]
    fn test_git_segment_flags_in_order() {
        let mut state = test_state();
        state.working_tree_dirty = true;
        state.index_state = IndexState::Staged;
        state.stash_present = true;
        assert_eq!(git_segment_text(&state), "main *+$");

        state.index_state = IndexState::NoCommitsYet;
        assert_eq!(git_segment_text(&state), "main *#$");
    }

    #[test]
    fn test_git_segment_operation_with_progress() {
        let mut state = test_state();
        state.head_label = "topic".to_string();
        state.operation = Operation::RebaseMerge;
        state.operation_progress = Some(("2".to_string(), "5".to_string()));
        assert_eq!(git_segment_text(&state), "topic|REBASE 2/5");
    }

    #[test]
    fn test_git_segment_mailbox_progress_rendered() {
        let mut state = test_state();
        state.operation = Operation::AmMailbox;
        state.operation_progress = Some(("1".to_string(), "3".to_string()));
        assert_eq!(git_segment_text(&state), "main|AM 1/3");
    }

    #[test]
    fn test_git_segment_progress_ignored_for_non_rebase() {
        let mut state = test_state();
        state.operation = Operation::Merging;
        state.operation_progress = Some(("2".to_string(), "5".to_string()));
        assert_eq!(git_segment_text(&state), "main|MERGING");
    }

    #[test]
    fn test_git_segment_divergence_arrows() {
        let mut state = test_state();
        state.upstream = Divergence::Ahead;
        assert_eq!(git_segment_text(&state), "main\u{2191}");
        state.upstream = Divergence::Behind;
        assert_eq!(git_segment_text(&state), "main\u{2193}");
        state.upstream = Divergence::Diverged;
        assert_eq!(git_segment_text(&state), "main\u{2195}");
    }

    #[test]
    fn test_no_upstream_and_in_sync_render_identically() {
        // Documented equivalence: neither case shows an arrow.
        let mut state = test_state();
        state.upstream = Divergence::NoUpstream;
        let no_upstream = git_segment_text(&state);
        state.upstream = Divergence::InSync;
        let in_sync = git_segment_text(&state);
        assert_eq!(no_upstream, in_sync);
        assert_eq!(no_upstream, "main");
    }

    #[test]
    fn test_bare_prefix_and_git_dir_label() {
        let mut state = test_state();
        state.bare_prefix = true;
        assert_eq!(git_segment_text(&state), "BARE:main");

        let mut state = test_state();
        state.head_label = "GIT_DIR!".to_string();
        state.bare_prefix = false;
        assert_eq!(git_segment_text(&state), "GIT_DIR!");
    }

    #[test]
    fn test_stash_flag_is_escaped_in_rendered_prompt() {
        let ctx = test_context();
        let mut state = test_state();
        state.stash_present = true;
        let out = render_prompt(&ctx, Some(&state));
        assert!(out.contains("main \\$"));
    }

    #[test]
    fn test_attention_color_selection() {
        let ctx = test_context();
        let clean = render_prompt(&ctx, Some(&test_state()));
        assert!(clean.contains("48;5;148"));
        assert!(!clean.contains("48;5;125"));

        let mut state = test_state();
        state.working_tree_dirty = true;
        let dirty = render_prompt(&ctx, Some(&state));
        assert!(dirty.contains("48;5;125"));
    }
}
