//! Shared names and defaults.

pub const APP_NAME: &str = "viter";

/// Config file location relative to the project root.
pub const DEFAULT_CONFIG_PATH: &str = "config/viter.yml";

/// Environment used when none is given.
pub const DEFAULT_ENV: &str = "development";

/// Env var overriding the config file path. Also injected into the build.
pub const CONFIG_ENV_VAR: &str = "VITER_CONFIG";

/// Env var overriding the asset host handed to the bundler.
pub const ASSET_HOST_ENV_VAR: &str = "VITER_ASSET_HOST";

/// Env var overriding the relative URL root handed to the bundler.
pub const RELATIVE_URL_ROOT_ENV_VAR: &str = "VITER_RELATIVE_URL_ROOT";

/// Prefix of the per-environment staleness record file.
pub const DIGEST_FILE_PREFIX: &str = "last-compilation-digest-";

/// Lock file serializing builds across processes, inside the cache dir.
pub const COMPILE_LOCK_FILENAME: &str = ".compile.lock";

/// Bundler manifest keys for images live under this relative directory.
pub const IMAGE_KEY_PREFIX: &str = "../assets/";

/// Env var naming the active environment for the CLI.
pub const ENV_VAR: &str = "VITER_ENV";
