//! The host-facing bundle of configuration, compiler and manifest.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::compile::{BuildOutcome, CompileError, Compiler};
use crate::config::{Config, ConfigError};
use crate::manifest::ManifestStore;
use crate::resolve::Resolver;

/// One project in one environment.
///
/// Hosts create this once at startup, call [`Viter::bootstrap`], and resolve
/// asset names through [`Viter::resolver`] for the rest of the process.
pub struct Viter {
  config: Config,
  compiler: Compiler,
  manifest: Arc<ManifestStore>,
  resolver: Resolver,
}

impl Viter {
  /// Load `config/viter.yml` under `root` for `env`.
  pub fn load(root: &Path, env: &str) -> Result<Self, ConfigError> {
    Ok(Self::new(Config::load(root, env)?))
  }

  pub fn new(config: Config) -> Self {
    let manifest = Arc::new(ManifestStore::from_config(&config));
    Self {
      compiler: Compiler::from_config(&config),
      resolver: Resolver::new(manifest.clone()),
      manifest,
      config,
    }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn env(&self) -> &str {
    &self.config.env
  }

  pub fn compiler(&self) -> &Compiler {
    &self.compiler
  }

  pub fn compiler_mut(&mut self) -> &mut Compiler {
    &mut self.compiler
  }

  pub fn manifest(&self) -> &Arc<ManifestStore> {
    &self.manifest
  }

  pub fn resolver(&self) -> &Resolver {
    &self.resolver
  }

  /// Replace the resolver, e.g. to attach a miss observer.
  pub fn set_resolver(&mut self, resolver: Resolver) {
    self.resolver = resolver;
  }

  /// Make sure the assets for the configured environment are current.
  ///
  /// After a rebuild the cached manifest is dropped so lookups see the new
  /// artifact.
  pub async fn bootstrap(&self) -> Result<BuildOutcome, CompileError> {
    let outcome = self.compiler.ensure_built(&self.config.env).await?;
    if let BuildOutcome::Rebuilt { .. } = outcome {
      self.manifest.reload();
      info!(env = %self.config.env, "manifest reloaded after build");
    }
    Ok(outcome)
  }
}
