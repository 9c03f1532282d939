//! Per-application push plans.
//!
//! A plan is created for every application left after overrides are
//! applied. It starts out knowing only what the manifest and flags say, then
//! picks up remote identifiers (application, package, droplet, deployment)
//! as the orchestrator works through each stage.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use super::client::{AppState, Lifecycle};
use super::error::PushError;
use super::overrides::{DeploymentStrategy, FlagOverrides};
use crate::manifest::{Application, ParsedManifest};

/// Registry credentials for a private docker image.
#[derive(Default, Clone, PartialEq, Eq, Serialize)]
pub struct DockerCredentials {
  pub username: String,
  #[serde(skip)]
  pub password: String,
}

impl std::fmt::Debug for DockerCredentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DockerCredentials")
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .finish()
  }
}

/// What the plan knows about the application on the platform.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct AppRecord {
  pub name: String,
  /// Set once the application is known to exist remotely.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub guid: Option<String>,
  pub state: AppState,
  pub lifecycle: Lifecycle,
}

/// Where a push is aimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanContext {
  pub org_guid: String,
  pub space_guid: String,
  /// Bits path when neither a flag nor the manifest provides one.
  pub working_dir: PathBuf,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PushPlan {
  pub space_guid: String,
  pub org_guid: String,
  pub application: AppRecord,

  /// Single-application manifest for this app.
  ///
  /// Carried for callers that apply or show manifests per application.
  /// [`PushActor`](super::PushActor) never reads it: the space-wide
  /// manifest goes through `apply_space_manifest`.
  #[serde(skip)]
  pub manifest: Vec<u8>,

  pub no_start: bool,
  pub no_wait: bool,
  pub no_route_flag: bool,
  pub random_route: bool,
  pub skip_route_creation: bool,
  pub strategy: DeploymentStrategy,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub docker_credentials: Option<DockerCredentials>,

  pub bits_path: PathBuf,
  /// `bits_path` is a file to upload as-is rather than a directory.
  pub archive: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub droplet_path: Option<PathBuf>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub package_guid: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub droplet_guid: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub deployment_guid: Option<String>,
}

impl PushPlan {
  pub fn app_name(&self) -> &str {
    &self.application.name
  }

  pub fn is_docker(&self) -> bool {
    self.application.lifecycle == Lifecycle::Docker
  }
}

impl std::fmt::Display for PushPlan {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "application: {} - space guid: {}, org guid: {}, archive: {}, bits path: {}",
      self.application.name,
      self.space_guid,
      self.org_guid,
      self.archive,
      self.bits_path.display()
    )
  }
}

/// Build one plan per application, in manifest order.
///
/// Expects a manifest that has already been through the override pipeline.
pub fn create_push_plans(
  manifest: &ParsedManifest,
  context: &PlanContext,
  overrides: &FlagOverrides,
) -> Result<Vec<PushPlan>, PushError> {
  manifest
    .applications
    .iter()
    .map(|app| create_push_plan(manifest, app, context, overrides))
    .collect()
}

fn create_push_plan(
  manifest: &ParsedManifest,
  app: &Application,
  context: &PlanContext,
  overrides: &FlagOverrides,
) -> Result<PushPlan, PushError> {
  if app.name.is_empty() {
    return Err(PushError::AppNameOrManifestRequired);
  }

  let bits_path = overrides
    .provided_app_path
    .clone()
    .or_else(|| app.path.clone())
    .unwrap_or_else(|| context.working_dir.clone());

  let archive = match fs::metadata(&bits_path) {
    Ok(metadata) => metadata.is_file(),
    Err(_) if app.is_docker() || overrides.droplet_path.is_some() => false,
    Err(e) => {
      return Err(PushError::BitsPath {
        path: bits_path.display().to_string(),
        message: e.to_string(),
      });
    }
  };

  let docker_credentials = app
    .docker
    .as_ref()
    .and_then(|docker| docker.username.clone())
    .map(|username| DockerCredentials {
      username,
      password: overrides.docker_password.clone().unwrap_or_default(),
    });

  let lifecycle = if app.is_docker() {
    Lifecycle::Docker
  } else {
    Lifecycle::Buildpack
  };

  let plan = PushPlan {
    space_guid: context.space_guid.clone(),
    org_guid: context.org_guid.clone(),
    application: AppRecord {
      name: app.name.clone(),
      guid: None,
      state: AppState::default(),
      lifecycle,
    },
    manifest: manifest.raw_app_manifest(&app.name)?,
    no_start: overrides.no_start,
    no_wait: overrides.no_wait,
    no_route_flag: overrides.no_route || app.no_route,
    random_route: overrides.random_route || app.random_route,
    skip_route_creation: false,
    strategy: overrides.strategy.unwrap_or_default(),
    docker_credentials,
    bits_path,
    archive,
    droplet_path: overrides.droplet_path.clone(),
    package_guid: None,
    droplet_guid: None,
    deployment_guid: None,
  };

  debug!(plan = %plan, "created push plan");
  Ok(plan)
}
