//! Flag groups shared by `deck push` and `deck manifest`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::info;

use deckhand_lib::interpolate::VarKv;
use deckhand_lib::manifest::{HealthCheckType, ParsedManifest, interpolate_and_parse, locate};
use deckhand_lib::push::FlagOverrides;

/// Where the manifest comes from and what feeds its `((variables))`.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
  /// Path to a manifest file, or a directory containing manifest.yml
  #[arg(short = 'f', long = "manifest", value_name = "PATH")]
  pub manifest: Option<PathBuf>,

  /// Ignore any manifest in the working directory
  #[arg(long)]
  pub no_manifest: bool,

  /// YAML file of variables to interpolate (repeatable, later files win)
  #[arg(long = "vars-file", value_name = "PATH")]
  pub vars_files: Vec<PathBuf>,

  /// Variable to interpolate as NAME=VALUE (repeatable, wins over vars files)
  #[arg(long = "var", value_name = "NAME=VALUE")]
  pub vars: Vec<VarKv>,
}

impl SourceArgs {
  /// Locate, interpolate, and parse the manifest these flags point at.
  ///
  /// Falls back to a single unnamed application when no manifest is found
  /// in `working_dir`. A path given with `-f` must exist.
  pub fn load(&self, working_dir: &Path) -> Result<ParsedManifest> {
    if self.no_manifest {
      return Ok(ParsedManifest::no_manifest());
    }

    let search = self.manifest.clone().unwrap_or_else(|| working_dir.to_path_buf());
    let found = locate(&search).with_context(|| format!("Failed to read manifest at {}", search.display()))?;

    match found {
      Some(path) => {
        info!(path = %path.display(), "using manifest");
        interpolate_and_parse(&path, &self.vars_files, &self.vars)
          .with_context(|| format!("Failed to load manifest {}", path.display()))
      }
      None if self.manifest.is_some() => {
        bail!("Incorrect Usage: The specified path '{}' does not exist.", search.display())
      }
      None => Ok(ParsedManifest::no_manifest()),
    }
  }
}

/// Flags that rewrite application settings in the manifest.
#[derive(Debug, Clone, Default, Args)]
pub struct OverrideArgs {
  /// Custom buildpack by name or URL (repeatable)
  #[arg(short = 'b', long = "buildpack", value_name = "BUILDPACK")]
  pub buildpacks: Vec<String>,

  /// Stack to use
  #[arg(short = 's', long)]
  pub stack: Option<String>,

  /// Disk limit, e.g. 256M or 1G
  #[arg(short = 'k', long)]
  pub disk: Option<String>,

  /// Memory limit, e.g. 256M or 1G
  #[arg(short = 'm', long)]
  pub memory: Option<String>,

  /// Number of instances
  #[arg(short = 'i', long)]
  pub instances: Option<u32>,

  /// Startup command
  #[arg(short = 'c', long = "start-command")]
  pub start_command: Option<String>,

  /// Health check type: port, process, or http
  #[arg(short = 'u', long = "health-check-type", value_name = "TYPE")]
  pub health_check_type: Option<HealthCheckType>,

  /// Endpoint polled by the http health check
  #[arg(long)]
  pub endpoint: Option<String>,

  /// Seconds allowed for a single health check invocation
  #[arg(short = 't', long = "app-start-timeout", value_name = "SECONDS")]
  pub app_start_timeout: Option<u64>,

  /// Docker image to push instead of application bits
  #[arg(short = 'o', long = "docker-image", value_name = "IMAGE")]
  pub docker_image: Option<String>,

  /// Registry user for a private docker image
  #[arg(long = "docker-username", value_name = "USER")]
  pub docker_username: Option<String>,

  /// Do not map a route to the application
  #[arg(long)]
  pub no_route: bool,

  /// Map a randomly generated route
  #[arg(long)]
  pub random_route: bool,
}

impl OverrideArgs {
  /// Build the override set for `app_name` loaded through `source`.
  pub fn to_overrides(&self, app_name: Option<String>, source: &SourceArgs) -> FlagOverrides {
    FlagOverrides {
      app_name,
      buildpacks: (!self.buildpacks.is_empty()).then(|| self.buildpacks.clone()),
      stack: self.stack.clone(),
      disk: self.disk.clone(),
      memory: self.memory.clone(),
      instances: self.instances,
      start_command: self.start_command.clone(),
      health_check_type: self.health_check_type,
      health_check_endpoint: self.endpoint.clone(),
      health_check_timeout: self.app_start_timeout,
      docker_image: self.docker_image.clone(),
      docker_username: self.docker_username.clone(),
      no_route: self.no_route,
      random_route: self.random_route,
      no_manifest: source.no_manifest,
      manifest_path_given: source.manifest.is_some(),
      vars_files_given: !source.vars_files.is_empty(),
      vars_given: !source.vars.is_empty(),
      ..FlagOverrides::default()
    }
  }
}
