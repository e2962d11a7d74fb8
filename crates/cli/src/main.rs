mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use viter_lib::consts::{APP_NAME, DEFAULT_ENV, ENV_VAR};
use viter_lib::resolve::AssetKind;

use cmd::ResolveTarget;

/// viter - build freshness and asset resolution for Vite projects
#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Project root
  #[arg(long, global = true, default_value = ".")]
  root: PathBuf,

  /// Environment to build and resolve for
  #[arg(short, long, global = true, env = ENV_VAR, default_value = DEFAULT_ENV)]
  env: String,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the assets if sources changed since the last build
  Compile {
    /// Build even if the last build is current
    #[arg(short, long)]
    force: bool,

    /// Fail instead of waiting when another process is already building
    #[arg(long)]
    no_wait: bool,
  },

  /// Show whether the last build is current
  Status {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Print the fingerprint of the watched files
  Digest,

  /// Resolve logical asset names through the manifest
  Resolve {
    /// What the names are
    #[arg(value_enum)]
    target: ResolveTarget,

    /// Logical names, e.g. `application` or `images/logo.png`
    #[arg(required = true)]
    names: Vec<String>,

    /// Extension to use instead of the kind's default (`key` target)
    #[arg(long)]
    ext: Option<String>,

    /// Asset kind for the `key` target
    #[arg(long, default_value_t = AssetKind::Script)]
    kind: AssetKind,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let level = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Compile { force, no_wait } => cmd::cmd_compile(&cli.root, &cli.env, force, no_wait),
    Commands::Status { json } => cmd::cmd_status(&cli.root, &cli.env, json),
    Commands::Digest => cmd::cmd_digest(&cli.root, &cli.env, cli.verbose),
    Commands::Resolve {
      target,
      names,
      ext,
      kind,
    } => cmd::cmd_resolve(&cli.root, &cli.env, target, &names, kind, ext.as_deref()),
  }
}
