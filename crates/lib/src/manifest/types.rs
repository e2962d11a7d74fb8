//! Manifest types.
//!
//! # Example
//!
//! ```json
//! {
//!   "app.js": {
//!     "file": "assets/app-4ed993c7.js",
//!     "src": "app.js",
//!     "isEntry": true,
//!     "css": ["assets/app-5fc0b4ac.css"],
//!     "imports": ["_vendor-46f5a2d8.js"]
//!   },
//!   "_vendor-46f5a2d8.js": {
//!     "file": "assets/vendor-46f5a2d8.js",
//!     "css": ["assets/vendor-0a1b2c3d.css"]
//!   },
//!   "../assets/logo.png": {
//!     "file": "assets/logo-d41d8cd9.png",
//!     "assets": ["assets/logo-d41d8cd9.png"]
//!   }
//! }
//! ```

use std::collections::HashMap;

use serde::Deserialize;

/// One output of the bundler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
  /// Primary output path, relative to the public output directory.
  pub file: String,
  /// Source path the entry was built from.
  #[serde(default)]
  pub src: Option<String>,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub is_entry: bool,
  #[serde(default)]
  pub is_dynamic_entry: bool,
  /// Physical asset paths; the first one is canonical.
  #[serde(default)]
  pub assets: Vec<String>,
  /// Stylesheets emitted for this entry.
  #[serde(default)]
  pub css: Vec<String>,
  /// Logical keys of the chunks this entry statically imports.
  #[serde(default)]
  pub imports: Vec<String>,
  #[serde(default)]
  pub dynamic_imports: Vec<String>,
}

impl Entry {
  /// Whether the primary output is itself a stylesheet (a CSS entrypoint).
  pub fn is_stylesheet(&self) -> bool {
    self.file.ends_with(".css")
  }
}

/// Logical key to [`Entry`]. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
  entries: HashMap<String, Entry>,
}

impl Manifest {
  /// Exact, case-sensitive lookup.
  pub fn get(&self, key: &str) -> Option<&Entry> {
    self.entries.get(key)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Keys of the entries the bundler marks as entrypoints, sorted.
  pub fn entrypoints(&self) -> Vec<&str> {
    let mut keys: Vec<&str> = self
      .entries
      .iter()
      .filter(|(_, entry)| entry.is_entry)
      .map(|(key, _)| key.as_str())
      .collect();
    keys.sort_unstable();
    keys
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_bundler_fields() {
    let manifest: Manifest = serde_json::from_str(
      r#"{
        "app.js": {
          "file": "assets/app-ab12.js",
          "src": "app.js",
          "isEntry": true,
          "css": ["assets/app-ab12.css"],
          "imports": ["_vendor.js"],
          "dynamicImports": ["lazy.js"]
        }
      }"#,
    )
    .unwrap();

    let entry = manifest.get("app.js").unwrap();
    assert_eq!(entry.file, "assets/app-ab12.js");
    assert!(entry.is_entry);
    assert_eq!(entry.css, vec!["assets/app-ab12.css"]);
    assert_eq!(entry.imports, vec!["_vendor.js"]);
    assert_eq!(entry.dynamic_imports, vec!["lazy.js"]);
    assert!(entry.assets.is_empty());
  }

  #[test]
  fn optional_fields_default_to_empty() {
    let manifest: Manifest = serde_json::from_str(r#"{"app.js": {"file": "app-ab12.js"}}"#).unwrap();
    let entry = manifest.get("app.js").unwrap();

    assert!(entry.css.is_empty());
    assert!(entry.imports.is_empty());
    assert!(!entry.is_entry);
  }

  #[test]
  fn unknown_fields_are_ignored() {
    let manifest: Manifest =
      serde_json::from_str(r#"{"app.js": {"file": "app.js", "integrity": "sha384-xyz"}}"#).unwrap();
    assert_eq!(manifest.len(), 1);
  }

  #[test]
  fn file_is_required() {
    let result = serde_json::from_str::<Manifest>(r#"{"app.js": {"css": []}}"#);
    assert!(result.is_err());
  }

  #[test]
  fn lookup_is_case_sensitive() {
    let manifest: Manifest = serde_json::from_str(r#"{"App.js": {"file": "a.js"}}"#).unwrap();
    assert!(manifest.get("App.js").is_some());
    assert!(manifest.get("app.js").is_none());
  }

  #[test]
  fn entrypoints_filters_chunks() {
    let manifest: Manifest = serde_json::from_str(
      r#"{
        "app.js": {"file": "a.js", "isEntry": true},
        "admin.js": {"file": "b.js", "isEntry": true},
        "_chunk.js": {"file": "c.js"}
      }"#,
    )
    .unwrap();

    assert_eq!(manifest.entrypoints(), vec!["admin.js", "app.js"]);
  }
}
