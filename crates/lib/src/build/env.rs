//! Build process environment.
//!
//! Three variables are injected for the bundler config to read:
//!
//! - `VITER_ASSET_HOST`: the asset host, from the environment or config
//! - `VITER_RELATIVE_URL_ROOT`: the relative URL root, from the environment or config
//! - `VITER_CONFIG`: the resolved config file path
//!
//! Extra variables from `build_env` are layered underneath: an injected
//! variable always wins over an extra one of the same name.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::consts::{ASSET_HOST_ENV_VAR, CONFIG_ENV_VAR, RELATIVE_URL_ROOT_ENV_VAR};

/// The variables to layer over the ambient environment for a build.
pub fn build_env(config: &Config) -> BTreeMap<String, String> {
  let mut env = config.build_env.clone();

  if let Some(host) = env_or(ASSET_HOST_ENV_VAR, config.asset_host.as_deref()) {
    env.insert(ASSET_HOST_ENV_VAR.to_string(), host);
  }
  if let Some(root) = env_or(RELATIVE_URL_ROOT_ENV_VAR, config.relative_url_root.as_deref()) {
    env.insert(RELATIVE_URL_ROOT_ENV_VAR.to_string(), root);
  }
  env.insert(CONFIG_ENV_VAR.to_string(), config.config_path.display().to_string());

  env
}

fn env_or(var: &str, fallback: Option<&str>) -> Option<String> {
  std::env::var(var).ok().or_else(|| fallback.map(str::to_string))
}
