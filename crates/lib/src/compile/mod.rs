//! Compilation orchestration.
//!
//! [`Compiler::ensure_built`] is the single entry point hosts call: it asks the
//! [`StalenessTracker`] whether the last build is still valid and, if not, runs
//! the bundler through a [`BuildInvoker`]. On success the fingerprint taken
//! *before* the build is recorded, so an edit made while the bundler runs is
//! seen as stale on the next check.
//!
//! Builds block the caller for as long as the bundler runs. Call this at
//! startup or from an explicit admin action, not per request.
//!
//! # Submodules
//!
//! - [`lock`] - cross-process compile lock

pub mod lock;

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::build::{BuildError, BuildInvoker, BuildRequest, CommandInvoker, build_env};
use crate::config::Config;
use crate::fingerprint::Fingerprint;
use crate::staleness::{Freshness, PersistenceError, StalenessTracker};

pub use lock::{CompileLock, CompileLockError};

#[derive(Debug, Error)]
pub enum CompileError {
  #[error(transparent)]
  Persistence(#[from] PersistenceError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error(transparent)]
  Lock(#[from] CompileLockError),
}

/// What `ensure_built` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
  /// The previous build is current; the bundler was not run.
  Skipped,
  /// The bundler ran and succeeded.
  Rebuilt { stdout: String, stderr: String },
  /// The bundler ran and failed. Previously built assets are left in place;
  /// the host decides whether this blocks serving.
  Failed { output: String },
}

impl BuildOutcome {
  pub fn is_failed(&self) -> bool {
    matches!(self, BuildOutcome::Failed { .. })
  }
}

pub struct Compiler<I = CommandInvoker> {
  tracker: StalenessTracker,
  invoker: I,
  build_env: BTreeMap<String, String>,
  root: PathBuf,
  cache_path: PathBuf,
  wait_for_lock: bool,
  guard: Mutex<()>,
}

impl Compiler<CommandInvoker> {
  pub fn from_config(config: &Config) -> Self {
    Self::new(
      StalenessTracker::from_config(config),
      CommandInvoker::new(config.build_command.clone()),
      build_env(config),
      config.root_path.clone(),
      config.cache_path.clone(),
    )
  }
}

impl<I: BuildInvoker> Compiler<I> {
  /// * `build_env` - variables layered over the ambient environment of the build
  /// * `root` - working directory of the build
  /// * `cache_path` - where the compile lock lives
  pub fn new(
    tracker: StalenessTracker,
    invoker: I,
    build_env: BTreeMap<String, String>,
    root: PathBuf,
    cache_path: PathBuf,
  ) -> Self {
    Self {
      tracker,
      invoker,
      build_env,
      root,
      cache_path,
      wait_for_lock: true,
      guard: Mutex::new(()),
    }
  }

  pub fn tracker(&self) -> &StalenessTracker {
    &self.tracker
  }

  pub fn invoker(&self) -> &I {
    &self.invoker
  }

  /// Whether to wait for a build running in another process. When false, a
  /// held compile lock fails with [`CompileLockError::Contention`].
  pub fn set_wait_for_lock(&mut self, wait: bool) {
    self.wait_for_lock = wait;
  }

  /// Run the bundler for `env` unless the last build is still current.
  pub async fn ensure_built(&self, env: &str) -> Result<BuildOutcome, CompileError> {
    self.tracker.record_path(env)?;
    if self.tracker.is_fresh(env) {
      debug!(env = %env, "build is fresh");
      return Ok(BuildOutcome::Skipped);
    }

    let _guard = self.guard.lock().await;
    let _lock = self.lock(env).await?;

    // Another caller may have finished the build while we waited.
    match self.tracker.check(env) {
      Freshness::Fresh(_) => {
        debug!(env = %env, "build finished by another caller");
        Ok(BuildOutcome::Skipped)
      }
      Freshness::Stale { reason, current } => {
        info!(env = %env, reason = %reason, "build is stale");
        self.run(env, current).await
      }
    }
  }

  /// Run the bundler for `env` regardless of freshness.
  pub async fn compile(&self, env: &str) -> Result<BuildOutcome, CompileError> {
    self.tracker.record_path(env)?;
    let _guard = self.guard.lock().await;
    let _lock = self.lock(env).await?;

    let current = match self.tracker.current_fingerprint() {
      Ok(fp) => Some(fp),
      Err(e) => {
        warn!(env = %env, error = %e, "fingerprinting failed");
        None
      }
    };
    self.run(env, current).await
  }

  async fn lock(&self, env: &str) -> Result<CompileLock, CompileError> {
    if !self.wait_for_lock {
      return Ok(CompileLock::try_acquire(&self.cache_path, env)?);
    }

    let cache_path = self.cache_path.clone();
    let env = env.to_string();

    let lock = tokio::task::spawn_blocking(move || CompileLock::acquire(&cache_path, &env))
      .await
      .map_err(|e| CompileLockError::LockFailed(io::Error::other(e)))??;
    Ok(lock)
  }

  async fn run(&self, env: &str, fingerprint: Option<Fingerprint>) -> Result<BuildOutcome, CompileError> {
    info!(env = %env, "compiling");

    let request = BuildRequest {
      env: self.build_env.clone(),
      cwd: self.root.clone(),
    };
    let output = self.invoker.invoke(&request).await?;

    if !output.success {
      let combined = output.combined();
      error!(env = %env, "compilation failed:\n{}", combined);
      return Ok(BuildOutcome::Failed { output: combined });
    }

    info!(env = %env, root = ?self.root, "compiled all entrypoints");
    if !output.stderr.trim().is_empty() {
      warn!(stderr = %output.stderr.trim_end(), "bundler wrote to stderr");
    }
    if !output.stdout.trim().is_empty() {
      info!(stdout = %output.stdout.trim_end(), "bundler output");
    }

    match fingerprint {
      Some(fp) => self.tracker.record_success(env, &fp)?,
      None => warn!(env = %env, "no fingerprint to record, next check will rebuild"),
    }

    Ok(BuildOutcome::Rebuilt {
      stdout: output.stdout,
      stderr: output.stderr,
    })
  }
}
