//! viter-lib: build freshness and manifest resolution for Vite-built assets
//!
//! This crate provides the pieces a host application needs to serve bundler
//! output:
//! - `Fingerprint`: a content digest over the watched source files
//! - `StalenessTracker`: per-environment record of the last successful build
//! - `Compiler`: runs the bundler when, and only when, sources changed
//! - `ManifestStore`: the parsed bundler manifest, loaded once
//! - `Resolver`: logical asset names to content-hashed output paths
//! - `Viter`: all of the above for one project and environment

pub mod build;
pub mod compile;
pub mod config;
pub mod consts;
pub mod fingerprint;
pub mod instance;
pub mod manifest;
pub mod resolve;
pub mod staleness;
pub mod util;

pub use instance::Viter;
