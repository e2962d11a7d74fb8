//! Manifest loading and caching.
//!
//! [`ManifestStore::load`] moves from unloaded to either a parsed manifest or
//! `NotPresent`. Concurrent first calls parse the file once: the slow path
//! takes the write lock and re-checks before reading. When caching is off
//! (development), every `load` re-reads the artifact, still one reader at a
//! time. Parse failures are not cached, so a fixed artifact is picked up on
//! the next call.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, info};

use super::Manifest;
use crate::config::Config;

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read manifest {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse manifest {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// Outcome of loading the manifest.
#[derive(Debug, Clone)]
pub enum ManifestState {
  Loaded(Arc<Manifest>),
  /// No manifest on disk: names resolve to themselves.
  NotPresent,
}

impl ManifestState {
  pub fn manifest(&self) -> Option<&Arc<Manifest>> {
    match self {
      ManifestState::Loaded(manifest) => Some(manifest),
      ManifestState::NotPresent => None,
    }
  }

  pub fn is_present(&self) -> bool {
    matches!(self, ManifestState::Loaded(_))
  }
}

/// Owns the parsed manifest for the process.
#[derive(Debug)]
pub struct ManifestStore {
  path: PathBuf,
  cache: bool,
  state: RwLock<Option<ManifestState>>,
  generation: AtomicU64,
}

impl ManifestStore {
  /// * `path` - manifest artifact
  /// * `cache` - keep the first load for the process lifetime
  pub fn new(path: PathBuf, cache: bool) -> Self {
    Self {
      path,
      cache,
      state: RwLock::new(None),
      generation: AtomicU64::new(0),
    }
  }

  pub fn from_config(config: &Config) -> Self {
    Self::new(config.manifest_path.clone(), config.cache_manifest)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Whether a manifest artifact exists on disk right now.
  pub fn exists(&self) -> bool {
    self.path.is_file()
  }

  /// Number of times the artifact has been read and parsed.
  pub fn generation(&self) -> u64 {
    self.generation.load(Ordering::SeqCst)
  }

  pub fn load(&self) -> Result<ManifestState, ManifestError> {
    if self.cache
      && let Some(state) = self.state.read().unwrap_or_else(PoisonError::into_inner).as_ref()
    {
      return Ok(state.clone());
    }

    let mut slot = self.state.write().unwrap_or_else(PoisonError::into_inner);
    if self.cache
      && let Some(state) = slot.as_ref()
    {
      return Ok(state.clone());
    }

    let state = self.read_artifact()?;
    *slot = Some(state.clone());
    Ok(state)
  }

  /// Drop the cached state; the next `load` reads the artifact again.
  pub fn reload(&self) {
    *self.state.write().unwrap_or_else(PoisonError::into_inner) = None;
    debug!(path = ?self.path, "manifest cache cleared");
  }

  fn read_artifact(&self) -> Result<ManifestState, ManifestError> {
    let content = match fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = ?self.path, "no manifest, resolving names as-is");
        return Ok(ManifestState::NotPresent);
      }
      Err(source) => {
        return Err(ManifestError::Read {
          path: self.path.clone(),
          source,
        });
      }
    };

    let manifest: Manifest = serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
      path: self.path.clone(),
      source,
    })?;

    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    info!(path = ?self.path, entries = manifest.len(), generation, "loaded manifest");
    Ok(ManifestState::Loaded(Arc::new(manifest)))
  }
}
