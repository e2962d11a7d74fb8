//! Implementation of the `viter compile` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use viter_lib::Viter;
use viter_lib::compile::BuildOutcome;

use crate::output::{format_duration, print_error, print_info, print_success};

/// Build the assets for `env` if they are stale, or unconditionally with
/// `force`. With `no_wait`, a build already running in another process is an
/// error instead of something to wait for.
///
/// A failed build prints the bundler output and exits non-zero.
pub fn cmd_compile(root: &Path, env: &str, force: bool, no_wait: bool) -> Result<()> {
  let mut viter = Viter::load(root, env).context("Failed to load config")?;
  viter.compiler_mut().set_wait_for_lock(!no_wait);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let start = Instant::now();
  let outcome = if force {
    rt.block_on(viter.compiler().compile(env))
  } else {
    rt.block_on(viter.bootstrap())
  }
  .context("Compile failed")?;

  match outcome {
    BuildOutcome::Skipped => print_info(&format!("Assets for {} are up to date", env)),
    BuildOutcome::Rebuilt { .. } => print_success(&format!(
      "Compiled assets for {} in {}",
      env,
      format_duration(start.elapsed())
    )),
    BuildOutcome::Failed { output } => {
      print_error(&format!("Build failed for {}", env));
      if !output.is_empty() {
        eprintln!("{}", output);
      }
      bail!("bundler exited unsuccessfully");
    }
  }

  Ok(())
}
