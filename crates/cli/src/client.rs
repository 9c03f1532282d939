//! A platform client that talks to nothing.
//!
//! Every call is logged and succeeds. Guids are derived from the call's
//! inputs, so the same push always produces the same guids.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use deckhand_lib::push::{AppState, DockerCredentials, Lifecycle, PlatformClient, RemoteApplication, Reply};
use deckhand_lib::util::hash::{hash_bytes, short_id};

#[derive(Debug, Default)]
pub struct DryRunClient;

impl DryRunClient {
  pub fn new() -> Self {
    Self
  }
}

fn ok<T>(value: T) -> Reply<T> {
  (Vec::new(), Ok(value))
}

#[async_trait]
impl PlatformClient for DryRunClient {
  async fn set_space_manifest(&self, space_guid: &str, raw_manifest: &[u8], no_route: bool) -> Reply<()> {
    let digest = hash_bytes(raw_manifest);
    info!(space = space_guid, manifest = %digest, no_route, "dry run: set space manifest");
    ok(())
  }

  async fn get_application_by_name(&self, name: &str, space_guid: &str) -> Reply<Option<RemoteApplication>> {
    info!(app = name, space = space_guid, "dry run: look up application");
    ok(None)
  }

  async fn create_application(&self, name: &str, space_guid: &str, lifecycle: Lifecycle) -> Reply<RemoteApplication> {
    let guid = short_id("app", &format!("{space_guid}/{name}"));
    info!(app = name, space = space_guid, ?lifecycle, guid = %guid, "dry run: create application");
    ok(RemoteApplication {
      guid,
      name: name.to_string(),
      state: AppState::Stopped,
      lifecycle,
    })
  }

  async fn create_and_map_default_route(&self, app_guid: &str, space_guid: &str, random_route: bool) -> Reply<()> {
    info!(app = app_guid, space = space_guid, random_route, "dry run: map default route");
    ok(())
  }

  async fn create_docker_package(&self, app_guid: &str, credentials: Option<&DockerCredentials>) -> Reply<String> {
    let guid = short_id("package", app_guid);
    let username = credentials.map(|c| c.username.as_str());
    info!(app = app_guid, ?username, guid = %guid, "dry run: create docker package");
    ok(guid)
  }

  async fn create_bits_package(&self, app_guid: &str) -> Reply<String> {
    let guid = short_id("package", app_guid);
    info!(app = app_guid, guid = %guid, "dry run: create bits package");
    ok(guid)
  }

  async fn upload_bits_package(&self, package_guid: &str, path: &Path, archive: bool) -> Reply<()> {
    info!(package = package_guid, path = %path.display(), archive, "dry run: upload bits");
    ok(())
  }

  async fn upload_droplet(&self, app_guid: &str, path: &Path) -> Reply<String> {
    let guid = short_id("droplet", &format!("{app_guid}/{}", path.display()));
    info!(app = app_guid, path = %path.display(), guid = %guid, "dry run: upload droplet");
    ok(guid)
  }

  async fn stop_application(&self, app_guid: &str) -> Reply<()> {
    info!(app = app_guid, "dry run: stop application");
    ok(())
  }

  async fn stage_package(&self, package_guid: &str) -> Reply<String> {
    let guid = short_id("droplet", package_guid);
    info!(package = package_guid, guid = %guid, "dry run: stage package");
    ok(guid)
  }

  async fn set_application_droplet(&self, app_guid: &str, droplet_guid: &str) -> Reply<()> {
    info!(app = app_guid, droplet = droplet_guid, "dry run: set droplet");
    ok(())
  }

  async fn restart_application(&self, app_guid: &str, no_wait: bool) -> Reply<()> {
    info!(app = app_guid, no_wait, "dry run: restart application");
    ok(())
  }

  async fn create_deployment(&self, app_guid: &str, droplet_guid: &str) -> Reply<String> {
    let guid = short_id("deployment", &format!("{app_guid}/{droplet_guid}"));
    info!(app = app_guid, droplet = droplet_guid, guid = %guid, "dry run: create deployment");
    ok(guid)
  }

  async fn wait_for_deployment(&self, deployment_guid: &str) -> Reply<()> {
    info!(deployment = deployment_guid, "dry run: wait for deployment");
    ok(())
  }
}
