//! Implementation of the `deck push` command.
//!
//! Loads the manifest, folds the command-line flags into it, and drives one
//! push plan per application through the orchestrator, printing each stage
//! as it happens.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use tracing::debug;

use deckhand_lib::config::PushConfig;
use deckhand_lib::push::{
  ClientError, DeploymentStrategy, Event, EventStream, FlagOverrides, PlanContext, PushActor, PushError, PushEvent,
  PushPlan, create_push_plans, transform_manifest,
};
use deckhand_lib::util::hash::short_id;

use super::args::{OverrideArgs, SourceArgs};
use crate::client::DryRunClient;
use crate::output::{OutputFormat, app_list, print_info, print_json_line, print_success, print_warning};

/// Registry password for private docker images.
pub const DOCKER_PASSWORD_ENV: &str = "DECKHAND_DOCKER_PASSWORD";

#[derive(Debug, Clone, Args)]
pub struct PushArgs {
  /// Name of the application to push
  pub app_name: Option<String>,

  #[command(flatten)]
  pub source: SourceArgs,

  #[command(flatten)]
  pub overrides: OverrideArgs,

  /// Prebuilt droplet to upload instead of staging
  #[arg(long, value_name = "PATH")]
  pub droplet: Option<PathBuf>,

  /// Application bits: a directory or an archive
  #[arg(short = 'p', long, value_name = "PATH")]
  pub path: Option<PathBuf>,

  /// Push without starting the application
  #[arg(long)]
  pub no_start: bool,

  /// Do not wait for instances to become healthy
  #[arg(long)]
  pub no_wait: bool,

  /// Deployment strategy: default or rolling
  #[arg(long, value_name = "STRATEGY")]
  pub strategy: Option<DeploymentStrategy>,

  /// Organization to push to
  #[arg(long, env = "DECKHAND_ORG")]
  pub org: Option<String>,

  /// Space to push to
  #[arg(long, env = "DECKHAND_SPACE")]
  pub space: Option<String>,

  /// How long to wait for staging, e.g. 15m
  #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
  pub staging_timeout: Option<Duration>,

  /// How long to wait for the application to start, e.g. 5m
  #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
  pub startup_timeout: Option<Duration>,
}

impl PushArgs {
  fn to_overrides(&self, docker_password: Option<String>) -> FlagOverrides {
    FlagOverrides {
      docker_password,
      droplet_path: self.droplet.clone(),
      provided_app_path: self.path.clone(),
      no_start: self.no_start,
      no_wait: self.no_wait,
      strategy: self.strategy,
      ..self.overrides.to_overrides(self.app_name.clone(), &self.source)
    }
  }

  fn target(&self) -> Result<(&str, &str)> {
    match (self.org.as_deref(), self.space.as_deref()) {
      (Some(org), Some(space)) if !org.is_empty() && !space.is_empty() => Ok((org, space)),
      _ => bail!("No org and space targeted. Use --org and --space, or set DECKHAND_ORG and DECKHAND_SPACE."),
    }
  }

  fn config(&self) -> Result<PushConfig> {
    let mut config = PushConfig::from_env().context("Invalid push configuration")?;
    if let Some(timeout) = self.staging_timeout {
      config = config.with_staging_timeout(timeout);
    }
    if let Some(timeout) = self.startup_timeout {
      config = config.with_startup_timeout(timeout);
    }
    Ok(config)
  }
}

/// Execute the push command.
///
/// Flags are validated before the manifest is read. Stages are printed as
/// text, or as one JSON event per line with `--format json`. The first
/// failing application stops the push.
pub fn cmd_push(args: PushArgs, format: OutputFormat) -> Result<()> {
  let (org, space) = args.target()?;
  let config = args.config()?;
  let working_dir = std::env::current_dir().context("Failed to read working directory")?;

  let docker_password = std::env::var(DOCKER_PASSWORD_ENV).ok().filter(|p| !p.is_empty());
  let overrides = args.to_overrides(docker_password);
  overrides.validate()?;

  let base = args.source.load(&working_dir)?;
  overrides.validate_for_multiple_apps(base.contains_multiple_apps())?;
  let manifest = transform_manifest(base, &overrides)?;

  if manifest.contains_private_docker_images() && overrides.docker_password.is_none() {
    bail!("Environment variable {DOCKER_PASSWORD_ENV} not set.");
  }

  let context = PlanContext {
    org_guid: short_id("org", org),
    space_guid: short_id("space", &format!("{org}/{space}")),
    working_dir,
  };
  let plans = create_push_plans(&manifest, &context, &overrides)?;
  let raw_manifest = manifest.raw_manifest().context("Failed to serialize manifest")?;

  if !format.is_json() {
    if let Some(path) = manifest.path_to_manifest() {
      print_info(&format!("Using manifest file {}", path.display()));
    }
    let names: Vec<&str> = plans.iter().map(PushPlan::app_name).collect();
    print_info(&format!("Pushing {} to org {org} / space {space}...", app_list(&names)));
  }

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(run(plans, raw_manifest, config, format))
}

async fn run(plans: Vec<PushPlan>, raw_manifest: Vec<u8>, config: PushConfig, format: OutputFormat) -> Result<()> {
  let actor = PushActor::new(Arc::new(DryRunClient::new()), config);

  drain(actor.apply_space_manifest(&plans, raw_manifest), format).await?;

  let (warnings, plans) = actor.update_application_settings(plans).await;
  for warning in &warnings {
    print_warning(warning);
  }
  let plans = plans?;

  for plan in plans {
    drain(actor.actualize(plan), format).await?;
  }

  Ok(())
}

/// Print every event on `stream` until it closes or reports an error.
async fn drain(mut stream: EventStream, format: OutputFormat) -> Result<()> {
  while let Some(event) = stream.recv().await {
    if format.is_json() {
      print_json_line(&event)?;
    } else {
      for warning in &event.warnings {
        print_warning(warning);
      }
    }

    if let Some(err) = event.error {
      return Err(describe_failure(event.plan.app_name(), err));
    }

    if !format.is_json() {
      print_event(&event);
    }
  }
  Ok(())
}

fn print_event(event: &PushEvent) {
  if event.event == Event::Complete {
    print_success(&format!("App {} pushed", event.plan.app_name()));
    return;
  }
  match event_message(event) {
    Some(message) => print_info(&message),
    None => debug!(event = %event.event, "no message for event"),
  }
}

/// The status line shown for `event`, if it gets one.
fn event_message(event: &PushEvent) -> Option<String> {
  let app = event.plan.app_name();
  let message = match event.event {
    Event::ApplyManifest => "Applying manifest...".to_string(),
    Event::ApplyManifestComplete => "Manifest applied".to_string(),
    Event::SkippingApplicationCreation => format!("Updating app {app}..."),
    Event::CreatingApplication => format!("Creating app {app}..."),
    Event::CreatingAndMappingRoutes => "Mapping routes...".to_string(),
    Event::UploadingApplicationWithArchive => "Uploading files...".to_string(),
    Event::UploadingDroplet => "Uploading droplet bits...".to_string(),
    Event::UploadWithArchiveComplete | Event::UploadDropletComplete => {
      "Waiting for API to complete processing files...".to_string()
    }
    Event::StoppingApplication => "Stopping Application...".to_string(),
    Event::StoppingApplicationComplete => "Application Stopped".to_string(),
    Event::StartingStaging => "Staging app...".to_string(),
    Event::RestartingApplication => format!("Waiting for app {app} to start..."),
    Event::StartingDeployment => format!("Starting deployment for app {app}..."),
    _ => return None,
  };
  Some(message)
}

/// Name the application in failures that only make sense per app.
fn describe_failure(app: &str, err: PushError) -> anyhow::Error {
  match err {
    PushError::Client(ClientError::AllInstancesCrashed) => {
      anyhow!("Start unsuccessful: all instances of app {app} crashed")
    }
    PushError::StartupTimeout(limit) => anyhow!(
      "Start app timeout: app {app} did not start within {}",
      humantime::format_duration(limit)
    ),
    other => anyhow::Error::new(other),
  }
}
