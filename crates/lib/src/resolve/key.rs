//! Manifest key derivation.
//!
//! Keys must match the bundler's manifest keys exactly:
//!
//! | kind | name | key |
//! |---|---|---|
//! | script | `app` | `app.js` |
//! | script | `/admin/app.ts` | `admin/app.ts` |
//! | stylesheet | `theme` | `theme.css` |
//! | image | `logo.png` | `../assets/logo.png` |

use std::path::Path;
use std::str::FromStr;

use crate::consts::IMAGE_KEY_PREFIX;

/// What a logical name refers to. Decides the key prefix and the default
/// extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AssetKind {
  #[default]
  Script,
  Stylesheet,
  Image,
  /// Any other asset: no prefix, no default extension.
  Other,
}

impl AssetKind {
  pub fn prefix(self) -> &'static str {
    match self {
      AssetKind::Image => IMAGE_KEY_PREFIX,
      _ => "",
    }
  }

  pub fn default_extension(self) -> Option<&'static str> {
    match self {
      AssetKind::Script => Some(".js"),
      AssetKind::Stylesheet => Some(".css"),
      AssetKind::Image | AssetKind::Other => None,
    }
  }
}

impl FromStr for AssetKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "script" | "javascript" | "js" => Ok(AssetKind::Script),
      "stylesheet" | "css" => Ok(AssetKind::Stylesheet),
      "image" => Ok(AssetKind::Image),
      "other" | "asset" => Ok(AssetKind::Other),
      other => Err(format!("unknown asset kind: {}", other)),
    }
  }
}

impl std::fmt::Display for AssetKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      AssetKind::Script => "script",
      AssetKind::Stylesheet => "stylesheet",
      AssetKind::Image => "image",
      AssetKind::Other => "other",
    };
    f.write_str(name)
  }
}

/// Build the manifest lookup key for `name`.
///
/// Leading `/` is stripped. The extension is `extension` if given (unless the
/// name already ends with it), else none if the name has its own extension,
/// else the kind's default.
pub fn manifest_key(name: &str, kind: AssetKind, extension: Option<&str>) -> String {
  let path = name.trim_start_matches('/');
  format!("{}{}{}", kind.prefix(), path, extension_for(path, kind, extension))
}

fn extension_for(path: &str, kind: AssetKind, explicit: Option<&str>) -> String {
  match explicit.filter(|ext| !ext.is_empty()) {
    Some(ext) => {
      let ext = if ext.starts_with('.') { ext.to_string() } else { format!(".{}", ext) };
      if path.ends_with(&ext) { String::new() } else { ext }
    }
    None if Path::new(path).extension().is_some() => String::new(),
    None => kind.default_extension().unwrap_or_default().to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn script_gets_default_extension() {
    assert_eq!(manifest_key("app", AssetKind::Script, None), "app.js");
  }

  #[test]
  fn own_extension_is_kept() {
    assert_eq!(manifest_key("app.ts", AssetKind::Script, None), "app.ts");
    assert_eq!(manifest_key("app.js", AssetKind::Script, None), "app.js");
  }

  #[test]
  fn explicit_extension_wins() {
    assert_eq!(manifest_key("app", AssetKind::Script, Some(".tsx")), "app.tsx");
    assert_eq!(manifest_key("app", AssetKind::Script, Some("mjs")), "app.mjs");
    assert_eq!(manifest_key("app.tsx", AssetKind::Script, Some(".tsx")), "app.tsx");
  }

  #[test]
  fn leading_separators_are_stripped() {
    assert_eq!(manifest_key("/admin/app", AssetKind::Script, None), "admin/app.js");
    assert_eq!(manifest_key("//app", AssetKind::Script, None), "app.js");
  }

  #[test]
  fn image_uses_asset_prefix_and_own_extension() {
    assert_eq!(manifest_key("logo.png", AssetKind::Image, None), "../assets/logo.png");
    assert_eq!(manifest_key("/icons/x.svg", AssetKind::Image, None), "../assets/icons/x.svg");
  }

  #[test]
  fn image_without_extension_gets_none() {
    assert_eq!(manifest_key("logo", AssetKind::Image, None), "../assets/logo");
    assert_eq!(manifest_key("logo", AssetKind::Image, Some("webp")), "../assets/logo.webp");
  }

  #[test]
  fn stylesheet_default_extension() {
    assert_eq!(manifest_key("theme", AssetKind::Stylesheet, None), "theme.css");
  }

  #[test]
  fn dotted_directory_does_not_count_as_extension() {
    assert_eq!(manifest_key("v1.2/app", AssetKind::Script, None), "v1.2/app.js");
  }

  #[test]
  fn kind_parses_from_str() {
    assert_eq!("image".parse::<AssetKind>().unwrap(), AssetKind::Image);
    assert_eq!("css".parse::<AssetKind>().unwrap(), AssetKind::Stylesheet);
    assert!("font".parse::<AssetKind>().is_err());
  }
}
