//! Spawning the bundler command.
//!
//! The command is an explicit argv from configuration (for example
//! `["bin/vite", "build"]` or `["ruby", "bin/vite", "build"]`). A relative
//! program path containing a separator resolves against the working
//! directory; bare names go through `PATH`.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};

use super::{BuildError, BuildInvoker, BuildOutput, BuildRequest};

/// Runs a fixed argv as the bundler build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvoker {
  argv: Vec<String>,
}

impl CommandInvoker {
  pub fn new(argv: Vec<String>) -> Self {
    Self { argv }
  }

  pub fn argv(&self) -> &[String] {
    &self.argv
  }

  /// Human-readable command line, for logs.
  pub fn command_line(&self) -> String {
    self.argv.join(" ")
  }
}

impl BuildInvoker for CommandInvoker {
  async fn invoke(&self, request: &BuildRequest) -> Result<BuildOutput, BuildError> {
    let (program, args) = self.argv.split_first().ok_or(BuildError::EmptyCommand)?;
    let program = resolve_program(program, &request.cwd);

    info!(cmd = %self.command_line(), cwd = ?request.cwd, "running bundler");

    // The ambient environment is inherited; request variables win.
    let output = Command::new(&program)
      .args(args)
      .envs(&request.env)
      .current_dir(&request.cwd)
      .kill_on_drop(true)
      .output()
      .await
      .map_err(|source| BuildError::Spawn {
        program: program.display().to_string(),
        source,
      })?;

    debug!(status = ?output.status, "bundler exited");

    Ok(BuildOutput {
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
      success: output.status.success(),
    })
  }
}

fn resolve_program(program: &str, cwd: &Path) -> PathBuf {
  let path = Path::new(program);
  if path.is_relative() && path.components().count() > 1 {
    cwd.join(path)
  } else {
    path.to_path_buf()
  }
}
