use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_SOURCE_PATH: &str = "app/frontend";
pub const DEFAULT_MANIFEST_PATH: &str = "public/vite/.vite/manifest.json";
pub const DEFAULT_CACHE_PATH: &str = "tmp/cache/viter";

/// Watched in addition to the source tree and `additional_paths`.
pub const DEFAULT_WATCHED_FILES: &[&str] = &["yarn.lock", "package.json", "config/vite/**/*"];

pub fn default_build_command() -> Vec<String> {
  vec!["bin/vite".to_string(), "build".to_string()]
}

/// Resolved configuration for one environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
  /// Environment id, e.g. `development` or `production`.
  pub env: String,
  /// Project root; the build runs here and relative paths resolve here.
  pub root_path: PathBuf,
  /// Config file location, handed to the bundler as `VITER_CONFIG`.
  pub config_path: PathBuf,
  /// Source tree, relative to the root, watched recursively.
  pub source_path: String,
  pub additional_paths: Vec<String>,
  /// Bundler manifest artifact.
  pub manifest_path: PathBuf,
  /// Staleness records and the compile lock live here.
  pub cache_path: PathBuf,
  pub cache_manifest: bool,
  /// Live-reload dev server, for hosts running in pass-through mode.
  pub dev_server_host: Option<String>,
  pub asset_host: Option<String>,
  pub relative_url_root: Option<String>,
  /// Bundler argv. Relative program paths resolve against the root.
  pub build_command: Vec<String>,
  /// Extra variables for the build process.
  pub build_env: BTreeMap<String, String>,
}

impl Config {
  /// Glob patterns whose contents decide whether a build is current.
  pub fn watch_patterns(&self) -> Vec<String> {
    let mut patterns = self.additional_paths.clone();
    patterns.push(format!("{}/**/*", self.source_path.trim_end_matches('/')));
    patterns.extend(DEFAULT_WATCHED_FILES.iter().map(|p| p.to_string()));
    patterns
  }
}

/// One section of the config file. Every field is optional so sections can
/// be layered.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Settings {
  pub source_path: Option<String>,
  pub additional_paths: Option<Vec<String>>,
  pub manifest_path: Option<PathBuf>,
  pub cache_path: Option<PathBuf>,
  pub cache_manifest: Option<bool>,
  pub dev_server_host: Option<String>,
  pub asset_host: Option<String>,
  pub relative_url_root: Option<String>,
  pub build_command: Option<Vec<String>>,
  pub build_env: Option<BTreeMap<String, String>>,
}

impl Settings {
  /// Layer `over` on top of `self`, field by field.
  pub fn merge(self, over: Settings) -> Settings {
    Settings {
      source_path: over.source_path.or(self.source_path),
      additional_paths: over.additional_paths.or(self.additional_paths),
      manifest_path: over.manifest_path.or(self.manifest_path),
      cache_path: over.cache_path.or(self.cache_path),
      cache_manifest: over.cache_manifest.or(self.cache_manifest),
      dev_server_host: over.dev_server_host.or(self.dev_server_host),
      asset_host: over.asset_host.or(self.asset_host),
      relative_url_root: over.relative_url_root.or(self.relative_url_root),
      build_command: over.build_command.or(self.build_command),
      build_env: match (self.build_env, over.build_env) {
        (Some(mut base), Some(over)) => {
          base.extend(over);
          Some(base)
        }
        (base, over) => over.or(base),
      },
    }
  }
}
