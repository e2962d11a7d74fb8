//! Logical asset name resolution.
//!
//! Turns entrypoint, stylesheet and image names into the content-hashed,
//! root-relative paths the bundler produced. Lookups that find nothing are
//! dropped from the result rather than failing; callers that care can watch
//! them through [`Resolver::with_observer`] or the `debug` log.
//!
//! When the manifest is absent (a dev server serves assets directly), every
//! operation passes names through unchanged.

mod key;

pub use key::{AssetKind, manifest_key};

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::manifest::{Entry, Manifest, ManifestError, ManifestState, ManifestStore};

/// A lookup that matched no manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissedLookup {
  /// The logical name, or the importing entry's key for a missing import.
  pub name: String,
  pub key: String,
}

pub type MissObserver = Arc<dyn Fn(&MissedLookup) + Send + Sync>;

/// Resolves logical names against the current manifest.
#[derive(Clone)]
pub struct Resolver {
  store: Arc<ManifestStore>,
  observer: Option<MissObserver>,
}

impl fmt::Debug for Resolver {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Resolver")
      .field("store", &self.store)
      .field("observer", &self.observer.is_some())
      .finish()
  }
}

impl Resolver {
  pub fn new(store: Arc<ManifestStore>) -> Self {
    Self { store, observer: None }
  }

  /// Call `observer` for every lookup that is dropped.
  pub fn with_observer(mut self, observer: impl Fn(&MissedLookup) + Send + Sync + 'static) -> Self {
    self.observer = Some(Arc::new(observer));
    self
  }

  pub fn store(&self) -> &Arc<ManifestStore> {
    &self.store
  }

  /// The manifest key for `name`. Same as [`manifest_key`].
  pub fn resolve_key(&self, name: &str, kind: AssetKind, extension: Option<&str>) -> String {
    manifest_key(name, kind, extension)
  }

  /// Output paths of the script entrypoints `names`, in order.
  pub fn resolve_scripts<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>, ManifestError> {
    let Some(manifest) = self.manifest()? else {
      return Ok(pass_through(names));
    };

    Ok(
      names
        .iter()
        .filter_map(|name| {
          let name = name.as_ref();
          self
            .lookup(&manifest, name, &manifest_key(name, AssetKind::Script, None))
            .map(|entry| root_relative(&entry.file))
        })
        .collect(),
    )
  }

  /// Stylesheets for the entrypoints `names`, including CSS pulled in through
  /// their imports.
  ///
  /// Per named entry: its own file if it is a stylesheet, then its `css`,
  /// then the `css` of each import (recursively) in listed order. Each key is expanded at most once
  /// per call, so cycles and diamonds terminate. Duplicate paths keep their
  /// first position.
  pub fn resolve_stylesheets<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>, ManifestError> {
    let Some(manifest) = self.manifest()? else {
      return Ok(pass_through(names));
    };

    let mut walk = Walk::default();
    for name in names {
      let name = name.as_ref();
      let key = manifest_key(name, AssetKind::Script, None);
      if let Some(entry) = self.lookup(&manifest, name, &key) {
        if entry.is_stylesheet() {
          walk.push(&entry.file);
        }
        self.collect_css(&manifest, &key, &mut walk);
      }
    }

    Ok(walk.finish())
  }

  /// Files of every chunk the entrypoints `names` transitively import, for
  /// module preloading. The entrypoints themselves are not included.
  pub fn resolve_preloads<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>, ManifestError> {
    let Some(manifest) = self.manifest()? else {
      return Ok(Vec::new());
    };

    let keys: Vec<(&str, String)> = names
      .iter()
      .map(|name| (name.as_ref(), manifest_key(name.as_ref(), AssetKind::Script, None)))
      .collect();

    let mut walk = Walk::default();
    walk.visited.extend(keys.iter().map(|(_, key)| key.clone()));
    for (name, key) in &keys {
      if let Some(entry) = self.lookup(&manifest, name, key) {
        for import in &entry.imports {
          self.collect_imports(&manifest, key, import, &mut walk);
        }
      }
    }

    Ok(walk.finish())
  }

  /// The canonical output path of the image `name`.
  pub fn resolve_image(&self, name: &str) -> Result<Option<String>, ManifestError> {
    self.resolve_asset(name, AssetKind::Image, None)
  }

  /// The canonical output path (first of `assets`) of the asset `name`.
  pub fn resolve_asset(
    &self,
    name: &str,
    kind: AssetKind,
    extension: Option<&str>,
  ) -> Result<Option<String>, ManifestError> {
    let Some(manifest) = self.manifest()? else {
      return Ok(Some(name.to_string()));
    };

    let key = manifest_key(name, kind, extension);
    Ok(
      self
        .lookup(&manifest, name, &key)
        .and_then(|entry| entry.assets.first())
        .map(|asset| root_relative(asset)),
    )
  }

  fn manifest(&self) -> Result<Option<Arc<Manifest>>, ManifestError> {
    Ok(match self.store.load()? {
      ManifestState::Loaded(manifest) => Some(manifest),
      ManifestState::NotPresent => None,
    })
  }

  fn lookup<'m>(&self, manifest: &'m Manifest, name: &str, key: &str) -> Option<&'m Entry> {
    let entry = manifest.get(key);
    if entry.is_none() {
      self.missed(name, key);
    }
    entry
  }

  fn missed(&self, name: &str, key: &str) {
    debug!(name = %name, key = %key, "no manifest entry");
    if let Some(observer) = &self.observer {
      observer(&MissedLookup {
        name: name.to_string(),
        key: key.to_string(),
      });
    }
  }

  fn collect_css(&self, manifest: &Manifest, key: &str, walk: &mut Walk) {
    if !walk.visited.insert(key.to_string()) {
      return;
    }
    let Some(entry) = manifest.get(key) else {
      return;
    };

    for css in &entry.css {
      walk.push(css);
    }
    for import in &entry.imports {
      if manifest.get(import).is_none() {
        self.missed(key, import);
      }
      self.collect_css(manifest, import, walk);
    }
  }

  fn collect_imports(&self, manifest: &Manifest, importer: &str, key: &str, walk: &mut Walk) {
    if !walk.visited.insert(key.to_string()) {
      return;
    }
    let Some(entry) = manifest.get(key) else {
      self.missed(importer, key);
      return;
    };

    walk.push(&entry.file);
    for import in &entry.imports {
      self.collect_imports(manifest, key, import, walk);
    }
  }
}

/// State of one import walk: expanded keys and collected paths.
#[derive(Default)]
struct Walk {
  visited: HashSet<String>,
  seen: HashSet<String>,
  paths: Vec<String>,
}

impl Walk {
  fn push(&mut self, path: &str) {
    if path.is_empty() {
      return;
    }
    let path = root_relative(path);
    if self.seen.insert(path.clone()) {
      self.paths.push(path);
    }
  }

  fn finish(self) -> Vec<String> {
    self.paths
  }
}

fn root_relative(path: &str) -> String {
  format!("/{}", path.trim_start_matches('/'))
}

fn pass_through<S: AsRef<str>>(names: &[S]) -> Vec<String> {
  names.iter().map(|name| name.as_ref().to_string()).collect()
}
