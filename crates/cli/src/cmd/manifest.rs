//! Implementation of the `deck manifest` command.
//!
//! Shows the manifest a push would apply, after variables are interpolated
//! and flags are folded in. Nothing is sent to the platform.

use anyhow::{Context, Result};
use clap::Args;

use deckhand_lib::push::transform_manifest;

use super::args::{OverrideArgs, SourceArgs};
use crate::output::{OutputFormat, print_json};

#[derive(Debug, Clone, Args)]
pub struct ManifestArgs {
  /// Name of the application to show or name
  pub app_name: Option<String>,

  #[command(flatten)]
  pub source: SourceArgs,

  #[command(flatten)]
  pub overrides: OverrideArgs,
}

/// Execute the manifest command.
///
/// Prints YAML by default, or the manifest model as JSON with `--format json`.
pub fn cmd_manifest(args: ManifestArgs, format: OutputFormat) -> Result<()> {
  let working_dir = std::env::current_dir().context("Failed to read working directory")?;

  let overrides = args.overrides.to_overrides(args.app_name.clone(), &args.source);
  overrides.validate()?;

  let base = args.source.load(&working_dir)?;
  overrides.validate_for_multiple_apps(base.contains_multiple_apps())?;
  let manifest = transform_manifest(base, &overrides)?;

  if format.is_json() {
    return print_json(&*manifest);
  }

  let raw = manifest.raw_manifest().context("Failed to serialize manifest")?;
  print!("{}", String::from_utf8_lossy(&raw));
  Ok(())
}
