//! # Promptline Library
//!
//! A one-shot, git-aware, powerline-style bash prompt generator.
//! This library provides:
//!
//! - Git repository state resolution via `git` subprocess probes
//! - Environment context gathering (user, host, working directory, virtualenv)
//! - PS1-safe colored segment rendering
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use promptline::{context::PromptContext, render::render_prompt, repo};
//!
//! let ctx = PromptContext::from_env(Some("0"));
//! let state = repo::resolve_repository_state(&ctx.probe_dir);
//! let prompt = render_prompt(&ctx, state.as_ref());
//! print!("{prompt}");
//! ```
//!
//! The binary is expected to be wired into bash as
//! `PS1='$(promptline "$?")'` (or via `PROMPT_COMMAND`); every field it
//! emits is escaped for prompt expansion before it reaches the terminal.

pub mod args;
pub mod command;
pub mod context;
pub mod error;
pub mod fsprobe;
pub mod logging;
pub mod render;
pub mod repo;

// Re-export commonly used types for convenience
pub use args::Args;
pub use repo::{Divergence, IndexState, Operation, RepoState};

/// Core result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
