use clap::Parser;
use std::io::Write;

use promptline::{
    Args,
    context::PromptContext,
    error::PromptResult,
    logging, render, repo,
};

fn main() -> PromptResult<()> {
    let args = Args::parse();
    let _log_guard = logging::init_logging(args.log_config());

    let ctx = PromptContext::from_env(args.last_exit.as_deref());
    let probe_dir = args.dir.as_deref().unwrap_or(&ctx.probe_dir);
    let state = repo::resolve_repository_state(probe_dir);

    let prompt = render::render_prompt(&ctx, state.as_ref());

    // One write, stdout only: the shell substitutes this into PS1.
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(prompt.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
