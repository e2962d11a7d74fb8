//! Project configuration.
//!
//! Settings come from `config/viter.yml` (or the file named by
//! `VITER_CONFIG`). The file holds a `default` section plus one section per
//! environment:
//!
//! ```yaml
//! default:
//!   source_path: app/frontend
//!   build_command: [bin/vite, build]
//! production:
//!   cache_manifest: true
//! ```
//!
//! The active environment's section is layered over `default`, which is
//! layered over built-in defaults. Relative paths resolve against the project
//! root.

mod types;

pub use types::*;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH};

const DEFAULT_SECTION: &str = "default";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },
}

impl Config {
  /// Load the configuration for `env` from the project at `root`.
  ///
  /// A missing config file is not an error: built-in defaults apply.
  pub fn load(root: &Path, env: &str) -> Result<Self, ConfigError> {
    let root = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let config_path = config_path(&root);

    let settings = match fs::read_to_string(&config_path) {
      Ok(content) => parse_settings(&content, env).map_err(|source| ConfigError::Parse {
        path: config_path.clone(),
        source,
      })?,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = ?config_path, "no config file, using defaults");
        Settings::default()
      }
      Err(source) => {
        return Err(ConfigError::Read {
          path: config_path,
          source,
        });
      }
    };

    Ok(Self::from_settings(root, config_path, env, settings))
  }

  /// Built-in defaults for `env`, without reading any file.
  pub fn defaults(root: &Path, env: &str) -> Self {
    Self::from_settings(root.to_path_buf(), config_path(root), env, Settings::default())
  }

  fn from_settings(root: PathBuf, config_path: PathBuf, env: &str, settings: Settings) -> Self {
    let Settings {
      source_path,
      additional_paths,
      manifest_path,
      cache_path,
      cache_manifest,
      dev_server_host,
      asset_host,
      relative_url_root,
      build_command,
      build_env,
    } = settings;

    Self {
      manifest_path: root.join(manifest_path.unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_PATH))),
      cache_path: root.join(cache_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_PATH))),
      source_path: source_path.unwrap_or_else(|| DEFAULT_SOURCE_PATH.to_string()),
      additional_paths: additional_paths.unwrap_or_default(),
      cache_manifest: cache_manifest.unwrap_or(env == "production"),
      dev_server_host,
      asset_host,
      relative_url_root,
      build_command: build_command.unwrap_or_else(default_build_command),
      build_env: build_env.unwrap_or_default(),
      env: env.to_string(),
      config_path,
      root_path: root,
    }
  }
}

/// Config file location: `$VITER_CONFIG` if set, else `config/viter.yml`.
pub fn config_path(root: &Path) -> PathBuf {
  match std::env::var(CONFIG_ENV_VAR) {
    Ok(path) if !path.is_empty() => root.join(path),
    _ => root.join(DEFAULT_CONFIG_PATH),
  }
}

fn parse_settings(content: &str, env: &str) -> Result<Settings, serde_yaml::Error> {
  if content.trim().is_empty() {
    return Ok(Settings::default());
  }

  // An empty section (`production:`) parses as null.
  let mut sections: BTreeMap<String, Option<Settings>> = serde_yaml::from_str(content)?;
  let base = sections.remove(DEFAULT_SECTION).flatten().unwrap_or_default();

  Ok(match sections.remove(env).flatten() {
    Some(overrides) => base.merge(overrides),
    None => base,
  })
}
