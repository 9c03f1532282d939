mod client;
mod cmd;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{ManifestArgs, PushArgs, cmd_manifest, cmd_push};
use output::OutputFormat;

/// deck - push applications from manifests
#[derive(Parser)]
#[command(name = "deck")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Push one application, or every application in a manifest
  Push(PushArgs),

  /// Print the manifest a push would apply
  Manifest(ManifestArgs),
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  // --verbose wins over RUST_LOG
  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .without_time()
    .with_writer(std::io::stderr)
    .init();

  match cli.command {
    Commands::Push(args) => cmd_push(args, cli.format),
    Commands::Manifest(args) => cmd_manifest(args, cli.format),
  }
}
