//! Implementation of the `viter resolve` command.
//!
//! Prints one resolved path per line. Names with no manifest entry are
//! reported on stderr and left out.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;

use viter_lib::Viter;
use viter_lib::resolve::{AssetKind, MissedLookup};

use crate::output::print_warning;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ResolveTarget {
  /// Entrypoint script files
  Script,
  /// Stylesheets of entrypoints, including imported CSS
  Stylesheet,
  /// Image files
  Image,
  /// Chunks imported by entrypoints
  Preload,
  /// Manifest lookup keys, without reading the manifest
  Key,
}

pub fn cmd_resolve(
  root: &Path,
  env: &str,
  target: ResolveTarget,
  names: &[String],
  kind: AssetKind,
  extension: Option<&str>,
) -> Result<()> {
  let mut viter = Viter::load(root, env).context("Failed to load config")?;
  let resolver = viter
    .resolver()
    .clone()
    .with_observer(|miss: &MissedLookup| print_warning(&format!("{}: no manifest entry {}", miss.name, miss.key)));
  viter.set_resolver(resolver);
  let resolver = viter.resolver();

  let paths = match target {
    ResolveTarget::Script => resolver.resolve_scripts(names)?,
    ResolveTarget::Stylesheet => resolver.resolve_stylesheets(names)?,
    ResolveTarget::Preload => resolver.resolve_preloads(names)?,
    ResolveTarget::Image => {
      let mut paths = Vec::new();
      for name in names {
        paths.extend(resolver.resolve_asset(name, AssetKind::Image, extension)?);
      }
      paths
    }
    ResolveTarget::Key => names
      .iter()
      .map(|name| resolver.resolve_key(name, kind, extension))
      .collect(),
  };

  for path in paths {
    println!("{}", path);
  }
  Ok(())
}
