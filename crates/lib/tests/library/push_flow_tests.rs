//! End-to-end push tests through the public API.
//!
//! A manifest on disk goes through interpolation, overrides, planning, and
//! the orchestrator against an in-memory platform.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use deckhand_lib::config::PushConfig;
use deckhand_lib::interpolate::VarKv;
use deckhand_lib::manifest::interpolate_and_parse;
use deckhand_lib::push::{
  AppState, ClientError, DockerCredentials, Event, EventStream, FlagOverrides, Lifecycle, PlanContext, PlatformClient,
  PushActor, PushError, PushEvent, RemoteApplication, Reply, create_push_plans, transform_manifest,
};

/// A platform that remembers applications across calls.
#[derive(Default)]
struct MemoryPlatform {
  apps: Mutex<Vec<RemoteApplication>>,
  crashing: HashSet<String>,
  manifests: Mutex<Vec<String>>,
}

impl MemoryPlatform {
  fn crashing(app_guid: &str) -> Self {
    Self {
      crashing: HashSet::from([app_guid.to_string()]),
      ..Self::default()
    }
  }

  fn app(&self, name: &str) -> Option<RemoteApplication> {
    self.apps.lock().unwrap().iter().find(|app| app.name == name).cloned()
  }

  fn set_state(&self, guid: &str, state: AppState) {
    if let Some(app) = self.apps.lock().unwrap().iter_mut().find(|app| app.guid == guid) {
      app.state = state;
    }
  }
}

fn ok<T>(value: T) -> Reply<T> {
  (Vec::new(), Ok(value))
}

#[async_trait]
impl PlatformClient for MemoryPlatform {
  async fn set_space_manifest(&self, _space_guid: &str, raw_manifest: &[u8], _no_route: bool) -> Reply<()> {
    self
      .manifests
      .lock()
      .unwrap()
      .push(String::from_utf8_lossy(raw_manifest).into_owned());
    (vec!["manifest applied with defaults".to_string()], Ok(()))
  }

  async fn get_application_by_name(&self, name: &str, _space_guid: &str) -> Reply<Option<RemoteApplication>> {
    ok(self.app(name))
  }

  async fn create_application(&self, name: &str, _space_guid: &str, lifecycle: Lifecycle) -> Reply<RemoteApplication> {
    let app = RemoteApplication {
      guid: format!("{name}-guid"),
      name: name.to_string(),
      state: AppState::Stopped,
      lifecycle,
    };
    self.apps.lock().unwrap().push(app.clone());
    ok(app)
  }

  async fn create_and_map_default_route(&self, _app_guid: &str, _space_guid: &str, _random_route: bool) -> Reply<()> {
    ok(())
  }

  async fn create_docker_package(&self, app_guid: &str, _credentials: Option<&DockerCredentials>) -> Reply<String> {
    ok(format!("{app_guid}-package"))
  }

  async fn create_bits_package(&self, app_guid: &str) -> Reply<String> {
    ok(format!("{app_guid}-package"))
  }

  async fn upload_bits_package(&self, _package_guid: &str, _path: &Path, _archive: bool) -> Reply<()> {
    ok(())
  }

  async fn upload_droplet(&self, app_guid: &str, _path: &Path) -> Reply<String> {
    ok(format!("{app_guid}-droplet"))
  }

  async fn stop_application(&self, app_guid: &str) -> Reply<()> {
    self.set_state(app_guid, AppState::Stopped);
    ok(())
  }

  async fn stage_package(&self, package_guid: &str) -> Reply<String> {
    ok(format!("{package_guid}-droplet"))
  }

  async fn set_application_droplet(&self, _app_guid: &str, _droplet_guid: &str) -> Reply<()> {
    ok(())
  }

  async fn restart_application(&self, app_guid: &str, _no_wait: bool) -> Reply<()> {
    if self.crashing.contains(app_guid) {
      return (Vec::new(), Err(ClientError::AllInstancesCrashed));
    }
    self.set_state(app_guid, AppState::Started);
    ok(())
  }

  async fn create_deployment(&self, app_guid: &str, _droplet_guid: &str) -> Reply<String> {
    ok(format!("{app_guid}-deployment"))
  }

  async fn wait_for_deployment(&self, _deployment_guid: &str) -> Reply<()> {
    ok(())
  }
}

async fn collect(mut stream: EventStream) -> Vec<PushEvent> {
  let mut events = Vec::new();
  while let Some(event) = stream.recv().await {
    events.push(event);
  }
  events
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
  let path = dir.join(name);
  std::fs::write(&path, content).unwrap();
  path
}

fn context(dir: &Path) -> PlanContext {
  PlanContext {
    org_guid: "org-guid".to_string(),
    space_guid: "space-guid".to_string(),
    working_dir: dir.to_path_buf(),
  }
}

const MANIFEST: &str = r#"
applications:
- name: ((prefix))-web
  memory: ((memory))
- name: ((prefix))-worker
  no-route: true
"#;

#[tokio::test]
async fn manifest_to_running_apps() {
  let temp = TempDir::new().unwrap();
  let manifest_path = write(temp.path(), "manifest.yml", MANIFEST);
  let vars_path = write(temp.path(), "vars.yml", "prefix: shop\nmemory: 128M\n");
  let inline: VarKv = "memory=1G".parse().unwrap();

  let parsed = interpolate_and_parse(&manifest_path, &[vars_path], &[inline]).unwrap();
  let overrides = FlagOverrides::default();
  overrides.validate().unwrap();
  let manifest = transform_manifest(parsed, &overrides).unwrap();
  assert_eq!(manifest.applications[0].settings.memory.as_deref(), Some("1G"));

  let plans = create_push_plans(&manifest, &context(temp.path()), &overrides).unwrap();
  assert_eq!(plans.len(), 2);
  assert!(plans[1].no_route_flag);

  let platform = Arc::new(MemoryPlatform::default());
  let actor = PushActor::new(Arc::clone(&platform), PushConfig::default());

  let applied = collect(actor.apply_space_manifest(&plans, manifest.raw_manifest().unwrap())).await;
  let tags: Vec<Event> = applied.iter().map(|e| e.event).collect();
  assert_eq!(tags, vec![Event::ApplyManifest, Event::ApplyManifestComplete]);
  assert_eq!(applied[1].warnings, vec!["manifest applied with defaults".to_string()]);
  assert!(platform.manifests.lock().unwrap()[0].contains("shop-web"));

  let (warnings, plans) = actor.update_application_settings(plans).await;
  assert!(warnings.is_empty());

  for plan in plans.unwrap() {
    let events = collect(actor.actualize(plan)).await;
    assert!(events.iter().all(|e| !e.is_error()));
    assert_eq!(events.last().unwrap().event, Event::Complete);
  }

  assert_eq!(platform.app("shop-web").unwrap().state, AppState::Started);
  assert_eq!(platform.app("shop-worker").unwrap().state, AppState::Started);
}

#[tokio::test]
async fn second_push_updates_existing_app() {
  let temp = TempDir::new().unwrap();
  let manifest_path = write(temp.path(), "manifest.yml", "applications:\n- name: web\n");
  let platform = Arc::new(MemoryPlatform::default());
  let actor = PushActor::new(Arc::clone(&platform), PushConfig::default());
  let overrides = FlagOverrides::default();

  for round in 0..2 {
    let parsed = interpolate_and_parse(&manifest_path, &[], &[]).unwrap();
    let plans = create_push_plans(&parsed, &context(temp.path()), &overrides).unwrap();
    let (_, plans) = actor.update_application_settings(plans).await;
    let plan = plans.unwrap().remove(0);

    let events = collect(actor.actualize(plan)).await;
    let first = events.first().unwrap().event;
    if round == 0 {
      assert_eq!(first, Event::CreatingApplication);
    } else {
      assert_eq!(first, Event::SkippingApplicationCreation);
    }
  }

  assert_eq!(platform.apps.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn crashed_app_ends_stream_with_error() {
  let temp = TempDir::new().unwrap();
  let manifest_path = write(temp.path(), "manifest.yml", "applications:\n- name: web\n");
  let platform = Arc::new(MemoryPlatform::crashing("web-guid"));
  let actor = PushActor::new(platform, PushConfig::default());

  let parsed = interpolate_and_parse(&manifest_path, &[], &[]).unwrap();
  let plans = create_push_plans(&parsed, &context(temp.path()), &FlagOverrides::default()).unwrap();
  let events = collect(actor.actualize(plans[0].clone())).await;

  let last = events.last().unwrap();
  assert_eq!(last.event, Event::RestartingApplication);
  assert_eq!(last.error, Some(PushError::Client(ClientError::AllInstancesCrashed)));
  assert_eq!(events.iter().filter(|e| e.is_error()).count(), 1);
}

#[tokio::test]
async fn app_name_override_narrows_multi_app_manifest() {
  let temp = TempDir::new().unwrap();
  let manifest_path = write(temp.path(), "manifest.yml", MANIFEST);
  let vars = ["prefix=shop".parse::<VarKv>().unwrap(), "memory=256M".parse().unwrap()];

  let parsed = interpolate_and_parse(&manifest_path, &[], &vars).unwrap();
  let overrides = FlagOverrides {
    app_name: Some("shop-worker".to_string()),
    instances: Some(4),
    ..FlagOverrides::default()
  };
  overrides.validate_for_multiple_apps(parsed.contains_multiple_apps()).unwrap();

  let manifest = transform_manifest(parsed, &overrides).unwrap();
  assert_eq!(manifest.app_names(), vec!["shop-worker"]);

  let plans = create_push_plans(&manifest, &context(temp.path()), &overrides).unwrap();
  assert_eq!(plans.len(), 1);
  assert_eq!(plans[0].app_name(), "shop-worker");
}
