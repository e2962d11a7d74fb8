//! Implementation of the `viter digest` command.

use std::path::Path;

use anyhow::{Context, Result};

use viter_lib::Viter;

use crate::output::symbols;

/// Print the fingerprint of the watched files. With `verbose`, list the
/// files on stderr first.
pub fn cmd_digest(root: &Path, env: &str, verbose: bool) -> Result<()> {
  let viter = Viter::load(root, env).context("Failed to load config")?;
  let watch = viter.compiler().tracker().watch_set();

  if verbose {
    let files = watch.files().context("Failed to collect watched files")?;
    for file in &files {
      let shown = file.strip_prefix(watch.root()).unwrap_or(file.as_path());
      eprintln!("  {} {}", symbols::INFO, shown.display());
    }
    eprintln!("{} file(s) watched", files.len());
  }

  let fingerprint = watch.fingerprint().context("Failed to fingerprint watched files")?;
  println!("{}", fingerprint);
  Ok(())
}
