//! A recording platform client for orchestrator tests.
//!
//! Every call is recorded as `"<method> <args>"`. Calls succeed with
//! predictable guids unless configured to fail, and can be given warnings
//! or an artificial delay per method.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::client::{AppState, ClientError, Lifecycle, PlatformClient, RemoteApplication, Reply};
use super::plan::DockerCredentials;

#[derive(Default)]
pub struct FakeClient {
  calls: Mutex<Vec<String>>,
  failures: HashMap<&'static str, ClientError>,
  warnings: HashMap<&'static str, Vec<String>>,
  delays: HashMap<&'static str, Duration>,
  apps: HashMap<String, RemoteApplication>,
}

impl FakeClient {
  pub fn new() -> Self {
    Self::default()
  }

  /// Make `method` return `err`.
  pub fn fail(mut self, method: &'static str, err: ClientError) -> Self {
    self.failures.insert(method, err);
    self
  }

  /// Attach `warnings` to every reply from `method`.
  pub fn warn(mut self, method: &'static str, warnings: &[&str]) -> Self {
    self
      .warnings
      .insert(method, warnings.iter().map(|w| w.to_string()).collect());
    self
  }

  /// Sleep for `delay` before `method` replies.
  pub fn delay(mut self, method: &'static str, delay: Duration) -> Self {
    self.delays.insert(method, delay);
    self
  }

  /// Pretend `app` already exists in every space.
  pub fn with_app(mut self, app: RemoteApplication) -> Self {
    self.apps.insert(app.name.clone(), app);
    self
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  /// Method names only, in call order.
  pub fn call_names(&self) -> Vec<String> {
    self
      .calls()
      .iter()
      .map(|call| call.split_whitespace().next().unwrap_or_default().to_string())
      .collect()
  }

  async fn reply<T>(&self, method: &'static str, args: String, value: T) -> Reply<T> {
    let call = if args.is_empty() {
      method.to_string()
    } else {
      format!("{method} {args}")
    };
    self.calls.lock().unwrap().push(call);

    if let Some(delay) = self.delays.get(method) {
      tokio::time::sleep(*delay).await;
    }

    let warnings = self.warnings.get(method).cloned().unwrap_or_default();
    match self.failures.get(method) {
      Some(err) => (warnings, Err(err.clone())),
      None => (warnings, Ok(value)),
    }
  }
}

#[async_trait]
impl PlatformClient for FakeClient {
  async fn set_space_manifest(&self, space_guid: &str, _raw_manifest: &[u8], no_route: bool) -> Reply<()> {
    self
      .reply("set_space_manifest", format!("{space_guid} no_route={no_route}"), ())
      .await
  }

  async fn get_application_by_name(&self, name: &str, _space_guid: &str) -> Reply<Option<RemoteApplication>> {
    let existing = self.apps.get(name).cloned();
    self.reply("get_application_by_name", name.to_string(), existing).await
  }

  async fn create_application(&self, name: &str, _space_guid: &str, lifecycle: Lifecycle) -> Reply<RemoteApplication> {
    let app = RemoteApplication {
      guid: format!("{name}-guid"),
      name: name.to_string(),
      state: AppState::Stopped,
      lifecycle,
    };
    self.reply("create_application", name.to_string(), app).await
  }

  async fn create_and_map_default_route(&self, app_guid: &str, _space_guid: &str, random_route: bool) -> Reply<()> {
    self
      .reply(
        "create_and_map_default_route",
        format!("{app_guid} random={random_route}"),
        (),
      )
      .await
  }

  async fn create_docker_package(&self, app_guid: &str, credentials: Option<&DockerCredentials>) -> Reply<String> {
    let user = credentials.map(|c| c.username.as_str()).unwrap_or("none");
    self
      .reply(
        "create_docker_package",
        format!("{app_guid} user={user}"),
        "package-guid".to_string(),
      )
      .await
  }

  async fn create_bits_package(&self, app_guid: &str) -> Reply<String> {
    self
      .reply("create_bits_package", app_guid.to_string(), "package-guid".to_string())
      .await
  }

  async fn upload_bits_package(&self, package_guid: &str, path: &Path, archive: bool) -> Reply<()> {
    self
      .reply(
        "upload_bits_package",
        format!("{package_guid} {} archive={archive}", path.display()),
        (),
      )
      .await
  }

  async fn upload_droplet(&self, app_guid: &str, path: &Path) -> Reply<String> {
    self
      .reply(
        "upload_droplet",
        format!("{app_guid} {}", path.display()),
        "droplet-guid".to_string(),
      )
      .await
  }

  async fn stop_application(&self, app_guid: &str) -> Reply<()> {
    self.reply("stop_application", app_guid.to_string(), ()).await
  }

  async fn stage_package(&self, package_guid: &str) -> Reply<String> {
    self
      .reply("stage_package", package_guid.to_string(), "droplet-guid".to_string())
      .await
  }

  async fn set_application_droplet(&self, app_guid: &str, droplet_guid: &str) -> Reply<()> {
    self
      .reply("set_application_droplet", format!("{app_guid} {droplet_guid}"), ())
      .await
  }

  async fn restart_application(&self, app_guid: &str, no_wait: bool) -> Reply<()> {
    self
      .reply("restart_application", format!("{app_guid} no_wait={no_wait}"), ())
      .await
  }

  async fn create_deployment(&self, app_guid: &str, droplet_guid: &str) -> Reply<String> {
    self
      .reply(
        "create_deployment",
        format!("{app_guid} {droplet_guid}"),
        "deployment-guid".to_string(),
      )
      .await
  }

  async fn wait_for_deployment(&self, deployment_guid: &str) -> Reply<()> {
    self.reply("wait_for_deployment", deployment_guid.to_string(), ()).await
  }
}
