//! Bundler invocation.
//!
//! The bundler is an external process. [`BuildInvoker`] is the boundary: given
//! an environment map and a working directory it runs the build and reports
//! captured output and success. [`CommandInvoker`] is the process-spawning
//! implementation; tests substitute their own.
//!
//! # Submodules
//!
//! - [`command`] - spawning the configured bundler command
//! - [`env`] - the variables injected into the build process

pub mod command;
pub mod env;

use std::collections::BTreeMap;
use std::future::Future;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use command::CommandInvoker;
pub use env::build_env;

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("build command is empty")]
  EmptyCommand,

  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },
}

/// What to run the bundler with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildRequest {
  /// Variables layered over the ambient process environment.
  pub env: BTreeMap<String, String>,
  /// Working directory, the project root.
  pub cwd: PathBuf,
}

/// Captured result of one bundler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
  pub stdout: String,
  pub stderr: String,
  pub success: bool,
}

impl BuildOutput {
  /// The non-empty output streams, stdout first, separated by a blank line.
  pub fn combined(&self) -> String {
    [self.stdout.trim_end(), self.stderr.trim_end()]
      .into_iter()
      .filter(|s| !s.is_empty())
      .collect::<Vec<_>>()
      .join("\n\n")
  }
}

/// Runs the external bundler.
pub trait BuildInvoker: Send + Sync {
  fn invoke(&self, request: &BuildRequest) -> impl Future<Output = Result<BuildOutput, BuildError>> + Send;
}
