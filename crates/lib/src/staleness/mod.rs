//! Staleness tracking.
//!
//! The tracker remembers, per environment, the fingerprint of the watched
//! files that produced the last successful build. A build is fresh when that
//! record exists, the build output (the manifest) exists, and the record
//! matches a freshly computed fingerprint.
//!
//! # Storage Layout
//!
//! ```text
//! {cache_path}/
//! ├── last-compilation-digest-development   # bare digest, no newline
//! └── last-compilation-digest-production
//! ```
//!
//! Reads fail safe: any problem reading a record means "stale". Writes are
//! atomic (temp file in the same directory, then rename) so concurrent
//! writers never leave a torn record.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::consts::DIGEST_FILE_PREFIX;
use crate::fingerprint::{Fingerprint, FingerprintError, WatchSet};

#[derive(Debug, Error)]
pub enum PersistenceError {
  #[error("invalid environment id {0:?}")]
  InvalidEnvironment(String),

  #[error("failed to create cache directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write staleness record {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Why a build is considered out of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
  /// No readable record for this environment.
  NoRecord,
  /// A record exists but the build output is gone.
  OutputMissing,
  /// The watched files changed since the recorded build.
  Changed,
  /// The current fingerprint could not be computed.
  FingerprintFailed,
}

impl std::fmt::Display for StaleReason {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let text = match self {
      StaleReason::NoRecord => "no previous build recorded",
      StaleReason::OutputMissing => "build output missing",
      StaleReason::Changed => "watched files changed",
      StaleReason::FingerprintFailed => "could not fingerprint watched files",
    };
    f.write_str(text)
  }
}

/// Result of a freshness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
  Fresh(Fingerprint),
  Stale {
    reason: StaleReason,
    /// Fingerprint of the watched files at check time, if it could be computed.
    current: Option<Fingerprint>,
  },
}

impl Freshness {
  pub fn is_fresh(&self) -> bool {
    matches!(self, Freshness::Fresh(_))
  }

  /// The fingerprint computed during the check.
  pub fn current(&self) -> Option<&Fingerprint> {
    match self {
      Freshness::Fresh(fp) => Some(fp),
      Freshness::Stale { current, .. } => current.as_ref(),
    }
  }
}

/// Persists and compares build fingerprints per environment.
#[derive(Debug, Clone)]
pub struct StalenessTracker {
  watch: WatchSet,
  cache_path: PathBuf,
  output_path: PathBuf,
}

impl StalenessTracker {
  /// * `watch` - files whose contents feed the fingerprint
  /// * `cache_path` - directory holding the records
  /// * `output_path` - build artifact that must exist for a build to be fresh
  pub fn new(watch: WatchSet, cache_path: PathBuf, output_path: PathBuf) -> Self {
    Self {
      watch,
      cache_path,
      output_path,
    }
  }

  pub fn from_config(config: &Config) -> Self {
    Self::new(
      WatchSet::new(&config.root_path, config.watch_patterns()),
      config.cache_path.clone(),
      config.manifest_path.clone(),
    )
  }

  pub fn watch_set(&self) -> &WatchSet {
    &self.watch
  }

  /// Path of the record file for `env`.
  pub fn record_path(&self, env: &str) -> Result<PathBuf, PersistenceError> {
    if env.is_empty() || env.contains(['/', '\\']) || env == "." || env == ".." {
      return Err(PersistenceError::InvalidEnvironment(env.to_string()));
    }
    Ok(self.cache_path.join(format!("{}{}", DIGEST_FILE_PREFIX, env)))
  }

  /// Fingerprint of the watched files right now.
  pub fn current_fingerprint(&self) -> Result<Fingerprint, FingerprintError> {
    self.watch.fingerprint()
  }

  /// The recorded fingerprint for `env`, or `None` if there is no usable
  /// record or the build output is missing.
  pub fn last_fingerprint(&self, env: &str) -> Option<Fingerprint> {
    if !self.output_path.exists() {
      return None;
    }
    self.read_record(env)
  }

  fn read_record(&self, env: &str) -> Option<Fingerprint> {
    let path = self.record_path(env).ok()?;
    match fs::read_to_string(&path) {
      Ok(content) => {
        let digest = content.trim();
        (!digest.is_empty()).then(|| Fingerprint(digest.to_string()))
      }
      Err(e) => {
        if e.kind() != io::ErrorKind::NotFound {
          debug!(path = ?path, error = %e, "unreadable staleness record");
        }
        None
      }
    }
  }

  /// Compare the recorded fingerprint for `env` with the current one.
  pub fn check(&self, env: &str) -> Freshness {
    let current = match self.current_fingerprint() {
      Ok(fp) => Some(fp),
      Err(e) => {
        warn!(env = %env, error = %e, "fingerprinting failed, assuming stale");
        None
      }
    };

    let stale = |reason, current| Freshness::Stale { reason, current };

    let Some(recorded) = self.read_record(env) else {
      return stale(StaleReason::NoRecord, current);
    };
    if !self.output_path.exists() {
      return stale(StaleReason::OutputMissing, current);
    }

    match current {
      Some(fp) if fp == recorded => Freshness::Fresh(fp),
      Some(fp) => stale(StaleReason::Changed, Some(fp)),
      None => stale(StaleReason::FingerprintFailed, None),
    }
  }

  pub fn is_fresh(&self, env: &str) -> bool {
    self.check(env).is_fresh()
  }

  /// Persist `fingerprint` as the last successful build for `env`.
  pub fn record_success(&self, env: &str, fingerprint: &Fingerprint) -> Result<(), PersistenceError> {
    let path = self.record_path(env)?;

    fs::create_dir_all(&self.cache_path).map_err(|source| PersistenceError::CreateDir {
      path: self.cache_path.clone(),
      source,
    })?;

    write_atomic(&self.cache_path, &path, fingerprint.as_str().as_bytes())
      .map_err(|source| PersistenceError::Write { path: path.clone(), source })?;

    debug!(env = %env, fingerprint = %fingerprint, path = ?path, "recorded build fingerprint");
    Ok(())
  }
}

fn write_atomic(dir: &Path, path: &Path, content: &[u8]) -> io::Result<()> {
  let mut temp = tempfile::NamedTempFile::new_in(dir)?;
  temp.write_all(content)?;
  temp.as_file().sync_all()?;
  temp.persist(path).map_err(|e| e.error)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::write_file;
  use tempfile::{TempDir, tempdir};

  fn project() -> (TempDir, StalenessTracker) {
    let temp = tempdir().unwrap();
    write_file(temp.path(), "app/frontend/app.js", "console.log('hi')");
    write_file(temp.path(), "package.json", "{}");

    let tracker = StalenessTracker::new(
      WatchSet::new(
        temp.path(),
        vec!["app/frontend/**/*".to_string(), "package.json".to_string()],
      ),
      temp.path().join("tmp/cache/viter"),
      temp.path().join("public/vite/manifest.json"),
    );
    (temp, tracker)
  }

  fn build_output(root: &Path) {
    write_file(root, "public/vite/manifest.json", "{}");
  }

  #[test]
  fn stale_without_record() {
    let (temp, tracker) = project();
    build_output(temp.path());

    let freshness = tracker.check("development");
    assert!(matches!(
      freshness,
      Freshness::Stale {
        reason: StaleReason::NoRecord,
        current: Some(_)
      }
    ));
    assert!(!tracker.is_fresh("development"));
  }

  #[test]
  fn fresh_after_record_success() {
    let (temp, tracker) = project();
    build_output(temp.path());

    let fp = tracker.current_fingerprint().unwrap();
    tracker.record_success("development", &fp).unwrap();

    assert_eq!(tracker.check("development"), Freshness::Fresh(fp));
  }

  #[test]
  fn stale_after_source_change() {
    let (temp, tracker) = project();
    build_output(temp.path());
    let fp = tracker.current_fingerprint().unwrap();
    tracker.record_success("development", &fp).unwrap();

    write_file(temp.path(), "app/frontend/app.js", "console.log('changed')");

    let freshness = tracker.check("development");
    assert!(matches!(
      freshness,
      Freshness::Stale {
        reason: StaleReason::Changed,
        ..
      }
    ));
  }

  #[test]
  fn fingerprint_failure_is_stale_not_fatal() {
    let (temp, tracker) = project();
    build_output(temp.path());
    let fp = tracker.current_fingerprint().unwrap();
    tracker.record_success("development", &fp).unwrap();

    let broken = StalenessTracker::new(
      WatchSet::new(temp.path(), vec!["app/frontend/[".to_string()]),
      temp.path().join("tmp/cache/viter"),
      temp.path().join("public/vite/manifest.json"),
    );

    assert!(matches!(
      broken.current_fingerprint(),
      Err(FingerprintError::InvalidPattern { .. })
    ));
    assert_eq!(
      broken.check("development"),
      Freshness::Stale {
        reason: StaleReason::FingerprintFailed,
        current: None
      }
    );
    assert!(!broken.is_fresh("development"));
  }

  #[test]
  fn stale_when_output_removed() {
    let (temp, tracker) = project();
    build_output(temp.path());
    let fp = tracker.current_fingerprint().unwrap();
    tracker.record_success("development", &fp).unwrap();

    fs::remove_file(temp.path().join("public/vite/manifest.json")).unwrap();

    assert!(matches!(
      tracker.check("development"),
      Freshness::Stale {
        reason: StaleReason::OutputMissing,
        ..
      }
    ));
    assert_eq!(tracker.last_fingerprint("development"), None);
  }

  #[test]
  fn records_are_per_environment() {
    let (temp, tracker) = project();
    build_output(temp.path());
    let fp = tracker.current_fingerprint().unwrap();
    tracker.record_success("production", &fp).unwrap();

    assert!(tracker.is_fresh("production"));
    assert!(!tracker.is_fresh("development"));
  }

  #[test]
  fn record_file_holds_bare_digest() {
    let (temp, tracker) = project();
    let fp = Fingerprint("abc123".to_string());
    tracker.record_success("test", &fp).unwrap();

    let path = temp.path().join("tmp/cache/viter/last-compilation-digest-test");
    assert_eq!(fs::read_to_string(path).unwrap(), "abc123");
  }

  #[test]
  fn record_overwrites_previous() {
    let (_temp, tracker) = project();
    tracker.record_success("test", &Fingerprint("one".to_string())).unwrap();
    tracker.record_success("test", &Fingerprint("two".to_string())).unwrap();

    assert_eq!(tracker.read_record("test"), Some(Fingerprint("two".to_string())));
  }

  #[test]
  fn garbage_record_is_stale() {
    let (temp, tracker) = project();
    build_output(temp.path());
    write_file(temp.path(), "tmp/cache/viter/last-compilation-digest-development", "not-a-digest");

    assert!(!tracker.is_fresh("development"));
  }

  #[test]
  fn unreadable_record_is_stale() {
    let (temp, tracker) = project();
    build_output(temp.path());
    // A directory where the record file should be.
    fs::create_dir_all(temp.path().join("tmp/cache/viter/last-compilation-digest-development")).unwrap();

    assert!(matches!(
      tracker.check("development"),
      Freshness::Stale {
        reason: StaleReason::NoRecord,
        ..
      }
    ));
  }

  #[test]
  fn path_like_environment_is_rejected() {
    let (_temp, tracker) = project();
    let err = tracker
      .record_success("../escape", &Fingerprint("x".to_string()))
      .unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidEnvironment(_)));
    assert!(!tracker.is_fresh("../escape"));
  }

  #[test]
  fn write_failure_is_reported() {
    let (temp, tracker) = project();
    // A file where the cache directory should be.
    write_file(temp.path(), "tmp/cache/viter", "blocking file");

    let err = tracker
      .record_success("development", &Fingerprint("x".to_string()))
      .unwrap_err();
    assert!(matches!(err, PersistenceError::CreateDir { .. }));
  }

  #[test]
  fn concurrent_writers_leave_a_whole_record() {
    let (_temp, tracker) = project();
    let values: Vec<String> = (0..8).map(|i| format!("{:064}", i)).collect();

    std::thread::scope(|scope| {
      for value in &values {
        let tracker = &tracker;
        scope.spawn(move || {
          tracker.record_success("development", &Fingerprint(value.clone())).unwrap();
        });
      }
    });

    let recorded = tracker.read_record("development").unwrap();
    assert!(values.contains(&recorded.0));
  }
}
