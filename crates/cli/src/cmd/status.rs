//! Status command implementation.
//!
//! Reports whether the last build for an environment is still current, and
//! what the resolver will see: the manifest's entrypoints, or pass-through to
//! the dev server when there is no manifest.

use std::path::Path;

use anyhow::{Context, Result};

use viter_lib::Viter;
use viter_lib::manifest::ManifestState;
use viter_lib::staleness::Freshness;

use crate::output::{print_info, print_json, print_stat, print_success, print_warning, truncate_hash};

pub fn cmd_status(root: &Path, env: &str, json: bool) -> Result<()> {
  let viter = Viter::load(root, env).context("Failed to load config")?;
  let tracker = viter.compiler().tracker();

  let freshness = tracker.check(env);
  let recorded = tracker.last_fingerprint(env);
  let record_path = tracker.record_path(env).ok();
  let manifest = match viter.manifest().load() {
    Ok(ManifestState::Loaded(manifest)) => Some(manifest),
    Ok(ManifestState::NotPresent) => None,
    Err(e) => {
      print_warning(&e.to_string());
      None
    }
  };
  let manifest_present = viter.manifest().exists();
  let entrypoints = manifest.as_ref().map(|m| m.entrypoints()).unwrap_or_default();
  let dev_server_host = viter.config().dev_server_host.as_deref();

  let reason = match &freshness {
    Freshness::Fresh(_) => None,
    Freshness::Stale { reason, .. } => Some(reason.to_string()),
  };

  if json {
    let json_output = serde_json::json!({
      "env": env,
      "fresh": freshness.is_fresh(),
      "reason": reason,
      "current": freshness.current().map(|fp| fp.as_str()),
      "recorded": recorded.as_ref().map(|fp| fp.as_str()),
      "record_path": record_path.as_ref().map(|p| p.display().to_string()),
      "manifest_path": viter.config().manifest_path.display().to_string(),
      "manifest_present": manifest_present,
      "manifest_entries": manifest.as_ref().map(|m| m.len()),
      "entrypoints": entrypoints,
      "dev_server_host": dev_server_host,
    });
    return print_json(&json_output);
  }

  match &reason {
    None => print_success(&format!("Assets for {} are up to date", env)),
    Some(reason) => print_warning(&format!("Assets for {} are stale: {}", env, reason)),
  }
  if let Some(current) = freshness.current() {
    print_stat("Current", truncate_hash(current.as_str()));
  }
  if let Some(recorded) = &recorded {
    print_stat("Recorded", truncate_hash(recorded.as_str()));
  }
  if let Some(path) = &record_path {
    print_stat("Record", &path.display().to_string());
  }
  print_stat("Manifest", &viter.config().manifest_path.display().to_string());

  match &manifest {
    Some(manifest) if manifest.is_empty() => {
      println!();
      print_warning("Manifest has no entries");
    }
    Some(manifest) => {
      print_stat("Entries", &manifest.len().to_string());
      if !entrypoints.is_empty() {
        print_stat("Entrypoints", &entrypoints.join(", "));
      }
    }
    None if !manifest_present => {
      println!();
      match dev_server_host {
        Some(host) => print_info(&format!("No manifest found. Assets are served by the dev server at {}.", host)),
        None => print_info("No manifest found. Names will resolve to themselves."),
      }
    }
    None => {}
  }

  Ok(())
}
