//! The remote platform as the push orchestrator sees it.
//!
//! Every call hands back the warnings the platform produced alongside its
//! result, whether or not it succeeded. Warnings are advisory: they are
//! surfaced to the user and never stop a push on their own.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::plan::DockerCredentials;

/// Advisory messages from the platform, in the order received.
pub type Warnings = Vec<String>;

/// Result of a remote call together with its warnings.
pub type Reply<T> = (Warnings, Result<T, ClientError>);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
  #[error("App '{name}' not found")]
  ApplicationNotFound { name: String },

  #[error("all instances of the application crashed")]
  AllInstancesCrashed,

  #[error("{message}")]
  Api { message: String },
}

/// Whether an application is meant to be running.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppState {
  Started,
  #[default]
  Stopped,
}

impl fmt::Display for AppState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AppState::Started => f.write_str("started"),
      AppState::Stopped => f.write_str("stopped"),
    }
  }
}

/// How an application's bits become a runnable droplet.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
  #[default]
  Buildpack,
  Docker,
}

/// An application as it exists in the target space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteApplication {
  pub guid: String,
  pub name: String,
  pub state: AppState,
  pub lifecycle: Lifecycle,
}

/// Operations the orchestrator needs from the platform API.
#[async_trait]
pub trait PlatformClient: Send + Sync {
  /// Apply a manifest to every application it names in the space.
  async fn set_space_manifest(&self, space_guid: &str, raw_manifest: &[u8], no_route: bool) -> Reply<()>;

  /// Look up an application by name; `None` when it does not exist yet.
  async fn get_application_by_name(&self, name: &str, space_guid: &str) -> Reply<Option<RemoteApplication>>;

  async fn create_application(&self, name: &str, space_guid: &str, lifecycle: Lifecycle) -> Reply<RemoteApplication>;

  async fn create_and_map_default_route(&self, app_guid: &str, space_guid: &str, random_route: bool) -> Reply<()>;

  /// Returns the package guid.
  async fn create_docker_package(&self, app_guid: &str, credentials: Option<&DockerCredentials>) -> Reply<String>;

  /// Returns the package guid.
  async fn create_bits_package(&self, app_guid: &str) -> Reply<String>;

  /// Upload a directory, or a ready-made archive when `archive` is set.
  async fn upload_bits_package(&self, package_guid: &str, path: &Path, archive: bool) -> Reply<()>;

  /// Returns the droplet guid.
  async fn upload_droplet(&self, app_guid: &str, path: &Path) -> Reply<String>;

  async fn stop_application(&self, app_guid: &str) -> Reply<()>;

  /// Stage a package and wait for the build; returns the droplet guid.
  async fn stage_package(&self, package_guid: &str) -> Reply<String>;

  async fn set_application_droplet(&self, app_guid: &str, droplet_guid: &str) -> Reply<()>;

  /// Restart and, unless `no_wait`, wait for instances to come up.
  async fn restart_application(&self, app_guid: &str, no_wait: bool) -> Reply<()>;

  /// Returns the deployment guid.
  async fn create_deployment(&self, app_guid: &str, droplet_guid: &str) -> Reply<String>;

  async fn wait_for_deployment(&self, deployment_guid: &str) -> Reply<()>;
}
