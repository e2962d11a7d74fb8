//! Watch-pattern expansion.
//!
//! Patterns use gitignore-style globs anchored at the literal directory
//! prefix of the pattern. Only that prefix is walked, so `app/frontend/**/*`
//! never touches `node_modules/`.

use std::io;
use std::path::{Path, PathBuf};

use ignore::overrides::{Override, OverrideBuilder};
use tracing::trace;
use walkdir::WalkDir;

use super::FingerprintError;

const GLOB_CHARS: &[char] = &['*', '?', '[', '{'];

/// A watch pattern split into the directory to walk and the glob to match
/// beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SplitPattern {
  pub base: PathBuf,
  pub glob: Option<String>,
}

pub(crate) fn split_pattern(pattern: &str) -> SplitPattern {
  let mut base = PathBuf::new();
  let mut rest: Vec<&str> = Vec::new();

  if pattern.starts_with('/') {
    base.push("/");
  }

  for part in pattern.split('/').filter(|p| !p.is_empty() && *p != ".") {
    if rest.is_empty() && !part.contains(GLOB_CHARS) {
      base.push(part);
    } else {
      rest.push(part);
    }
  }

  SplitPattern {
    base,
    glob: (!rest.is_empty()).then(|| rest.join("/")),
  }
}

/// Expand one pattern relative to `root` into the regular files it matches.
pub(crate) fn expand(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, FingerprintError> {
  let split = split_pattern(pattern);
  let base = root.join(&split.base);

  let Some(glob) = split.glob else {
    // Literal path; is_file follows symlinks and rejects directories.
    return Ok(if base.is_file() { vec![base] } else { Vec::new() });
  };

  if !base.is_dir() {
    trace!(pattern = %pattern, base = ?base, "watch base missing");
    return Ok(Vec::new());
  }

  let matcher = build_matcher(&base, pattern, &glob)?;
  let dotfiles = glob.split('/').any(|segment| segment.starts_with('.'));
  let mut files = Vec::new();

  let walk = WalkDir::new(&base)
    .follow_links(true)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| entry.depth() == 0 || dotfiles || !is_hidden(entry));

  for entry in walk {
    let entry = match entry {
      Ok(entry) => entry,
      // Vanished mid-walk: it was never enumerated, so it does not count.
      Err(e) if e.io_error().map(|io| io.kind()) == Some(io::ErrorKind::NotFound) => continue,
      Err(e) => {
        return Err(FingerprintError::Walk {
          path: e.path().unwrap_or(&base).to_path_buf(),
          message: e.to_string(),
        });
      }
    };

    if entry.file_type().is_dir() {
      continue;
    }

    let rel = entry.path().strip_prefix(&base).unwrap_or(entry.path());
    if matcher.matched(rel, false).is_whitelist() {
      files.push(entry.into_path());
    }
  }

  Ok(files)
}

/// Dot-entries below the base are skipped unless the glob names them
/// explicitly, e.g. `**/.babelrc`.
fn is_hidden(entry: &walkdir::DirEntry) -> bool {
  entry.file_name().to_string_lossy().starts_with('.')
}

fn build_matcher(base: &Path, pattern: &str, glob: &str) -> Result<Override, FingerprintError> {
  let invalid = |e: ignore::Error| FingerprintError::InvalidPattern {
    pattern: pattern.to_string(),
    message: e.to_string(),
  };

  let mut builder = OverrideBuilder::new(base);
  builder.add(&format!("/{}", glob)).map_err(invalid)?;
  builder.build().map_err(invalid)
}
