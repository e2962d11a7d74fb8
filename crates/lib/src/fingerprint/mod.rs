//! Content fingerprinting of the watched source tree.
//!
//! A fingerprint is a SHA-256 over the sorted per-file identifiers
//! `<basename>/<sha256 of contents>`, joined with `/`. Using the basename
//! keeps the digest stable across checkout locations. Two files with the same
//! basename and content anywhere in the watch set are indistinguishable; moving
//! a file between watched directories does not change the fingerprint. The
//! on-disk digest format depends on this, so it is kept as is.

mod glob;

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::util::hash::{hash_bytes, hash_file};

/// Digest identifying one state of the watched files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub String);

impl Fingerprint {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Error)]
pub enum FingerprintError {
  /// A matched file could not be read, usually because it was removed between
  /// enumeration and hashing.
  #[error("watched file unavailable: {path}: {source}")]
  FileUnavailable {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid watch pattern {pattern:?}: {message}")]
  InvalidPattern { pattern: String, message: String },

  #[error("failed to walk {path}: {message}")]
  Walk { path: PathBuf, message: String },
}

/// The set of files whose contents decide whether a build is current.
#[derive(Debug, Clone)]
pub struct WatchSet {
  root: PathBuf,
  patterns: Vec<String>,
}

impl WatchSet {
  /// Create a watch set of glob `patterns` relative to `root`.
  pub fn new(root: impl Into<PathBuf>, patterns: Vec<String>) -> Self {
    Self {
      root: root.into(),
      patterns,
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn patterns(&self) -> &[String] {
    &self.patterns
  }

  /// Every regular file matched by at least one pattern, sorted by path.
  pub fn files(&self) -> Result<Vec<PathBuf>, FingerprintError> {
    let mut files = BTreeSet::new();
    for pattern in &self.patterns {
      files.extend(glob::expand(&self.root, pattern)?);
    }
    Ok(files.into_iter().collect())
  }

  /// Fingerprint the current contents of the watch set.
  pub fn fingerprint(&self) -> Result<Fingerprint, FingerprintError> {
    let files = self.files()?;
    let fingerprint = fingerprint_files(&files)?;
    debug!(files = files.len(), fingerprint = %fingerprint, "computed watch fingerprint");
    Ok(fingerprint)
  }
}

/// Fingerprint an explicit list of files. Order of `files` does not matter.
pub fn fingerprint_files(files: &[PathBuf]) -> Result<Fingerprint, FingerprintError> {
  let mut ids = files
    .iter()
    .map(|path| file_id(path))
    .collect::<Result<Vec<_>, _>>()?;
  ids.sort();

  Ok(Fingerprint(hash_bytes(ids.join("/").as_bytes()).0))
}

fn file_id(path: &Path) -> Result<String, FingerprintError> {
  let hash = hash_file(path).map_err(|source| FingerprintError::FileUnavailable {
    path: path.to_path_buf(),
    source,
  })?;
  let basename = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
  Ok(format!("{}/{}", basename, hash))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::write_file;
  use tempfile::tempdir;

  fn watch(root: &Path) -> WatchSet {
    WatchSet::new(
      root,
      vec!["app/frontend/**/*".to_string(), "package.json".to_string()],
    )
  }

  #[test]
  fn fingerprint_is_deterministic() {
    let temp = tempdir().unwrap();
    write_file(temp.path(), "app/frontend/app.js", "console.log(1)");
    write_file(temp.path(), "package.json", "{}");

    let set = watch(temp.path());
    assert_eq!(set.fingerprint().unwrap(), set.fingerprint().unwrap());
  }

  #[test]
  fn input_order_does_not_matter() {
    let temp = tempdir().unwrap();
    write_file(temp.path(), "a.js", "a");
    write_file(temp.path(), "b.js", "b");
    let a = temp.path().join("a.js");
    let b = temp.path().join("b.js");

    assert_eq!(
      fingerprint_files(&[a.clone(), b.clone()]).unwrap(),
      fingerprint_files(&[b, a]).unwrap()
    );
  }

  #[test]
  fn checkout_location_does_not_matter() {
    let one = tempdir().unwrap();
    let two = tempdir().unwrap();
    for root in [one.path(), two.path()] {
      write_file(root, "app/frontend/app.js", "same");
      write_file(root, "package.json", "{}");
    }

    assert_eq!(
      watch(one.path()).fingerprint().unwrap(),
      watch(two.path()).fingerprint().unwrap()
    );
  }

  #[test]
  fn same_basename_in_different_directories_collides() {
    // Known limitation: identity is basename + content, not the full path.
    let temp = tempdir().unwrap();
    write_file(temp.path(), "left/index.js", "x");
    write_file(temp.path(), "right/index.js", "x");

    let moved = tempdir().unwrap();
    write_file(moved.path(), "other/index.js", "x");
    write_file(moved.path(), "index.js", "x");

    let set = |root: &Path| WatchSet::new(root, vec!["**/*".to_string()]);
    assert_eq!(
      set(temp.path()).fingerprint().unwrap(),
      set(moved.path()).fingerprint().unwrap()
    );
  }

  #[test]
  fn content_change_changes_fingerprint() {
    let temp = tempdir().unwrap();
    write_file(temp.path(), "app/frontend/app.js", "original");
    let set = watch(temp.path());
    let before = set.fingerprint().unwrap();

    write_file(temp.path(), "app/frontend/app.js", "modified");
    assert_ne!(before, set.fingerprint().unwrap());
  }

  #[test]
  fn new_file_changes_fingerprint() {
    let temp = tempdir().unwrap();
    write_file(temp.path(), "app/frontend/app.js", "a");
    let set = watch(temp.path());
    let before = set.fingerprint().unwrap();

    write_file(temp.path(), "package.json", "{}");
    assert_ne!(before, set.fingerprint().unwrap());
  }

  #[test]
  fn unwatched_files_are_ignored() {
    let temp = tempdir().unwrap();
    write_file(temp.path(), "app/frontend/app.js", "a");
    let set = watch(temp.path());
    let before = set.fingerprint().unwrap();

    write_file(temp.path(), "node_modules/pkg/index.js", "x");
    write_file(temp.path(), "app/models/user.rb", "class User; end");
    assert_eq!(before, set.fingerprint().unwrap());
  }

  #[test]
  fn editor_and_cache_churn_keeps_fingerprint() {
    let temp = tempdir().unwrap();
    write_file(temp.path(), "app/frontend/app.js", "a");
    let set = watch(temp.path());
    let before = set.fingerprint().unwrap();

    write_file(temp.path(), "app/frontend/.app.js.swp", "swap");
    write_file(temp.path(), "app/frontend/.cache/x", "x");
    assert_eq!(before, set.fingerprint().unwrap());
    assert_eq!(set.files().unwrap(), vec![temp.path().join("app/frontend/app.js")]);
  }

  #[test]
  fn overlapping_patterns_count_files_once() {
    let temp = tempdir().unwrap();
    write_file(temp.path(), "app/frontend/app.js", "a");

    let single = WatchSet::new(temp.path(), vec!["app/frontend/**/*".to_string()]);
    let overlapping = WatchSet::new(
      temp.path(),
      vec!["app/frontend/**/*".to_string(), "app/**/*.js".to_string()],
    );

    assert_eq!(overlapping.files().unwrap().len(), 1);
    assert_eq!(single.fingerprint().unwrap(), overlapping.fingerprint().unwrap());
  }

  #[test]
  fn empty_watch_set_has_a_fingerprint() {
    let temp = tempdir().unwrap();
    let fp = watch(temp.path()).fingerprint().unwrap();
    assert_eq!(fp.as_str(), hash_bytes(b"").0);
  }

  #[test]
  fn missing_file_is_unavailable() {
    let temp = tempdir().unwrap();
    let err = fingerprint_files(&[temp.path().join("gone.js")]).unwrap_err();
    assert!(matches!(err, FingerprintError::FileUnavailable { .. }));
  }
}
