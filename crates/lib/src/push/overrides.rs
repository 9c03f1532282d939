//! Command-line overrides for a push.
//!
//! Every manifest-affecting field is optional so that an explicit `0`, `""`,
//! or `false` is distinguishable from a flag that was never given.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::transform::TransformError;
use crate::manifest::HealthCheckType;

/// How a started application is brought up on the platform.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStrategy {
  /// Stop, swap the droplet, and restart.
  #[default]
  Default,
  /// Replace instances gradually through a deployment.
  Rolling,
}

impl DeploymentStrategy {
  pub fn as_str(&self) -> &'static str {
    match self {
      DeploymentStrategy::Default => "default",
      DeploymentStrategy::Rolling => "rolling",
    }
  }
}

impl fmt::Display for DeploymentStrategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for DeploymentStrategy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "default" => Ok(DeploymentStrategy::Default),
      "rolling" => Ok(DeploymentStrategy::Rolling),
      other => Err(format!("invalid deployment strategy '{other}' (expected default or rolling)")),
    }
  }
}

/// Flags that cannot be combined.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OverrideError {
  #[error("Incorrect Usage: The following arguments cannot be used together: {}", args.join(", "))]
  ArgumentCombination { args: Vec<String> },

  #[error("Incorrect Usage: '{required}' and '{given}' must be given together.")]
  RequiredFlags { required: String, given: String },
}

impl OverrideError {
  fn combination(args: &[&str]) -> Self {
    OverrideError::ArgumentCombination {
      args: args.iter().map(|a| a.to_string()).collect(),
    }
  }

  fn required(required: &str, given: &str) -> Self {
    OverrideError::RequiredFlags {
      required: required.to_string(),
      given: given.to_string(),
    }
  }
}

/// One invocation's worth of requested overrides.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlagOverrides {
  pub app_name: Option<String>,
  pub buildpacks: Option<Vec<String>>,
  pub stack: Option<String>,
  pub disk: Option<String>,
  pub memory: Option<String>,
  pub instances: Option<u32>,
  pub start_command: Option<String>,
  pub health_check_type: Option<HealthCheckType>,
  pub health_check_endpoint: Option<String>,
  /// Seconds.
  pub health_check_timeout: Option<u64>,
  pub docker_image: Option<String>,
  pub docker_username: Option<String>,
  pub docker_password: Option<String>,
  pub droplet_path: Option<PathBuf>,
  pub provided_app_path: Option<PathBuf>,
  pub no_route: bool,
  pub random_route: bool,
  pub no_start: bool,
  pub no_wait: bool,
  pub strategy: Option<DeploymentStrategy>,

  // Manifest source switches; only consulted by validation.
  pub no_manifest: bool,
  pub manifest_path_given: bool,
  pub vars_files_given: bool,
  pub vars_given: bool,
}

impl FlagOverrides {
  /// Whether no manifest-affecting override is set.
  pub fn is_empty(&self) -> bool {
    self.app_name.is_none()
      && self.buildpacks.is_none()
      && self.stack.is_none()
      && self.disk.is_none()
      && self.memory.is_none()
      && self.instances.is_none()
      && self.start_command.is_none()
      && self.health_check_type.is_none()
      && self.health_check_endpoint.is_none()
      && self.health_check_timeout.is_none()
      && self.docker_image.is_none()
      && self.docker_username.is_none()
      && !self.no_route
      && !self.random_route
  }

  /// Reject flag combinations that can never be satisfied.
  ///
  /// Checks run in a fixed order and the first conflict wins.
  pub fn validate(&self) -> Result<(), OverrideError> {
    let docker_image = self.docker_image.is_some();
    let app_path = self.provided_app_path.is_some();
    let http = self.health_check_type == Some(HealthCheckType::Http);
    let endpoint = self.health_check_endpoint.as_deref().is_some_and(|e| !e.is_empty());

    if self.docker_username.is_some() && !docker_image {
      return Err(OverrideError::required("--docker-image, -o", "--docker-username"));
    }
    if docker_image && self.buildpacks.is_some() {
      return Err(OverrideError::combination(&["--buildpack, -b", "--docker-image, -o"]));
    }
    if docker_image && app_path {
      return Err(OverrideError::combination(&["--docker-image, -o", "--path, -p"]));
    }
    if docker_image && self.stack.is_some() {
      return Err(OverrideError::combination(&["--stack, -s", "--docker-image, -o"]));
    }
    if self.no_manifest && self.manifest_path_given {
      return Err(OverrideError::combination(&["--no-manifest", "--manifest, -f"]));
    }
    if self.no_manifest && self.vars_files_given {
      return Err(OverrideError::combination(&["--no-manifest", "--vars-file"]));
    }
    if self.no_manifest && self.vars_given {
      return Err(OverrideError::combination(&["--no-manifest", "--var"]));
    }
    if http && !endpoint {
      return Err(OverrideError::required("--endpoint", "--health-check-type=http, -u=http"));
    }
    if endpoint && !http {
      return Err(OverrideError::required("--health-check-type=http, -u=http", "--endpoint"));
    }
    if self.droplet_path.is_some() && (docker_image || self.docker_username.is_some() || app_path) {
      return Err(OverrideError::combination(&[
        "--droplet",
        "--docker-image, -o",
        "--docker-username",
        "-p",
      ]));
    }
    if self.no_start && self.strategy == Some(DeploymentStrategy::Rolling) {
      return Err(OverrideError::combination(&["--no-start", "--strategy=rolling"]));
    }
    if self.no_start && self.no_wait {
      return Err(OverrideError::combination(&["--no-start", "--no-wait"]));
    }
    if self.no_route && self.random_route {
      return Err(OverrideError::combination(&["--no-route", "--random-route"]));
    }

    Ok(())
  }

  /// Reject per-app flags when no app name narrows a multi-app manifest.
  pub fn validate_for_multiple_apps(&self, contains_multiple_apps: bool) -> Result<(), TransformError> {
    if self.app_name.is_some() {
      return Ok(());
    }

    let per_app_flags = self.droplet_path.is_some() || self.provided_app_path.is_some() || self.strategy.is_some();
    if contains_multiple_apps && per_app_flags {
      return Err(TransformError::MultipleAppsOverride);
    }

    Ok(())
  }
}
