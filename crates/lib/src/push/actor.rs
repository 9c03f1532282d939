//! The push orchestrator.
//!
//! Each run happens on its own tokio task and reports progress over a
//! bounded channel. The worker is the only sender: it emits a start event
//! for a stage, makes the stage's remote calls, then emits the matching
//! completion event carrying every warning those calls produced.
//!
//! # Failure
//!
//! The first failed call ends the run. The worker emits one event carrying
//! the error, tagged with the stage that failed, and returns. Nothing is
//! retried here.
//!
//! # Abandonment
//!
//! Dropping the receiver is the only way to stop a run early. The worker
//! notices on its next send and returns without starting another stage.
//!
//! # Stage order for [`PushActor::actualize`]
//!
//! 1. Create the application unless it already exists
//! 2. Map the default route unless routes are disabled
//! 3. Upload a droplet, create a docker package, or package and upload bits
//! 4. With `no_start`, stop a running application and finish
//! 5. Stage the package (bounded by the staging timeout)
//! 6. Roll out a deployment, or set the droplet and restart (bounded by the
//!    startup timeout)

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::client::{AppState, ClientError, PlatformClient, Reply, Warnings};
use super::error::PushError;
use super::event::{Event, PushEvent};
use super::overrides::DeploymentStrategy;
use super::plan::PushPlan;
use crate::config::PushConfig;

/// Receiving end of a push run. Closes when the worker returns.
pub type EventStream = mpsc::Receiver<PushEvent>;

/// Why a worker stopped before finishing.
#[derive(Debug)]
enum Halt {
  /// The receiver was dropped.
  Abandoned,
  /// A terminal error event was sent.
  Failed,
}

/// Sending half owned by a worker.
struct Emitter {
  tx: mpsc::Sender<PushEvent>,
}

impl Emitter {
  async fn emit(&self, event: Event, warnings: Warnings, plan: &PushPlan) -> Result<(), Halt> {
    debug!(app = %plan.app_name(), %event, warnings = warnings.len(), "push event");
    self
      .tx
      .send(PushEvent {
        event,
        warnings,
        error: None,
        plan: plan.clone(),
      })
      .await
      .map_err(|_| {
        debug!(app = %plan.app_name(), "event receiver dropped, stopping push");
        Halt::Abandoned
      })
  }

  async fn fail(&self, stage: Event, error: PushError, warnings: Warnings, plan: &PushPlan) -> Halt {
    info!(app = %plan.app_name(), %stage, error = %error, "push failed");
    let sent = self
      .tx
      .send(PushEvent {
        event: stage,
        warnings,
        error: Some(error),
        plan: plan.clone(),
      })
      .await;

    match sent {
      Ok(()) => Halt::Failed,
      Err(_) => Halt::Abandoned,
    }
  }
}

/// One stage in flight: its start tag and the warnings gathered so far.
struct Stage<'a> {
  events: &'a Emitter,
  start: Event,
  warnings: Warnings,
}

impl<'a> Stage<'a> {
  async fn begin(events: &'a Emitter, start: Event, plan: &PushPlan) -> Result<Stage<'a>, Halt> {
    events.emit(start, Vec::new(), plan).await?;
    Ok(Stage {
      events,
      start,
      warnings: Vec::new(),
    })
  }

  /// Keep a reply's warnings; on error, end the run with them.
  async fn settle<T>(&mut self, reply: Reply<T>, plan: &PushPlan) -> Result<T, Halt> {
    let (warnings, result) = reply;
    self.warnings.extend(warnings);

    match result {
      Ok(value) => Ok(value),
      Err(err) => Err(self.abort(err.into(), plan).await),
    }
  }

  /// Like [`Stage::settle`], giving up with `on_timeout` after `limit`.
  async fn settle_within<T, F>(
    &mut self,
    limit: Duration,
    on_timeout: PushError,
    call: F,
    plan: &PushPlan,
  ) -> Result<T, Halt>
  where
    F: Future<Output = Reply<T>>,
  {
    match tokio::time::timeout(limit, call).await {
      Ok(reply) => self.settle(reply, plan).await,
      Err(_) => Err(self.abort(on_timeout, plan).await),
    }
  }

  async fn abort(&mut self, error: PushError, plan: &PushPlan) -> Halt {
    let warnings = std::mem::take(&mut self.warnings);
    self.events.fail(self.start, error, warnings, plan).await
  }

  async fn complete(self, done: Event, plan: &PushPlan) -> Result<(), Halt> {
    self.events.emit(done, self.warnings, plan).await
  }
}

/// Drives push plans against a platform client.
pub struct PushActor<C: PlatformClient + 'static> {
  client: Arc<C>,
  config: PushConfig,
}

impl<C: PlatformClient + 'static> PushActor<C> {
  pub fn new(client: Arc<C>, config: PushConfig) -> Self {
    Self { client, config }
  }

  pub fn config(&self) -> &PushConfig {
    &self.config
  }

  fn channel(&self) -> (Emitter, EventStream) {
    let (tx, rx) = mpsc::channel(self.config.event_buffer.max(1));
    (Emitter { tx }, rx)
  }

  /// Apply the manifest to the space targeted by the first plan.
  ///
  /// Emits `ApplyManifest`, then `ApplyManifestComplete` with the call's
  /// warnings or a single error event. An empty plan list yields one
  /// [`PushError::NoPushPlans`] event.
  pub fn apply_space_manifest(&self, plans: &[PushPlan], raw_manifest: Vec<u8>) -> EventStream {
    let (events, rx) = self.channel();
    let client = Arc::clone(&self.client);
    let plan = plans.first().cloned();

    tokio::spawn(async move {
      debug!("starting apply manifest task");

      let Some(plan) = plan else {
        events
          .fail(Event::ApplyManifest, PushError::NoPushPlans, Vec::new(), &PushPlan::default())
          .await;
        return;
      };

      let result = async {
        let mut stage = Stage::begin(&events, Event::ApplyManifest, &plan).await?;
        let reply = client
          .set_space_manifest(&plan.space_guid, &raw_manifest, plan.no_route_flag)
          .await;
        stage.settle(reply, &plan).await?;
        stage.complete(Event::ApplyManifestComplete, &plan).await
      }
      .await;

      debug!(?result, "apply manifest task finished");
    });

    rx
  }

  /// Push one application through every stage its plan calls for.
  pub fn actualize(&self, plan: PushPlan) -> EventStream {
    let (events, rx) = self.channel();
    let client = Arc::clone(&self.client);
    let config = self.config;

    tokio::spawn(async move {
      let app = plan.app_name().to_string();
      info!(app = %app, "actualizing push plan");

      let result = Worker {
        client: client.as_ref(),
        config,
        events: &events,
      }
      .run(plan)
      .await;

      debug!(app = %app, ?result, "push task finished");
    });

    rx
  }

  /// Look up each planned application in its space.
  ///
  /// Existing applications get their guid and state filled in; missing
  /// ones are left to be created. Warnings from every lookup are returned.
  pub async fn update_application_settings(&self, plans: Vec<PushPlan>) -> (Warnings, Result<Vec<PushPlan>, PushError>) {
    let mut all_warnings = Warnings::new();
    let mut updated = Vec::with_capacity(plans.len());

    for mut plan in plans {
      let (warnings, result) = self
        .client
        .get_application_by_name(&plan.application.name, &plan.space_guid)
        .await;
      all_warnings.extend(warnings);

      match result {
        Ok(Some(remote)) => {
          debug!(app = %remote.name, guid = %remote.guid, state = %remote.state, "found existing application");
          plan.application.guid = Some(remote.guid);
          plan.application.state = remote.state;
        }
        Ok(None) | Err(ClientError::ApplicationNotFound { .. }) => {
          debug!(app = %plan.application.name, "application does not exist yet");
        }
        Err(err) => return (all_warnings, Err(err.into())),
      }

      updated.push(plan);
    }

    (all_warnings, Ok(updated))
  }
}

/// State for one `actualize` run.
struct Worker<'a, C: PlatformClient> {
  client: &'a C,
  config: PushConfig,
  events: &'a Emitter,
}

impl<C: PlatformClient> Worker<'_, C> {
  async fn run(&self, mut plan: PushPlan) -> Result<(), Halt> {
    let app_guid = self.ensure_application(&mut plan).await?;

    if !(plan.no_route_flag || plan.skip_route_creation) {
      self.map_routes(&app_guid, &plan).await?;
    }

    self.upload_bits(&app_guid, &mut plan).await?;

    if plan.no_start {
      if plan.application.state == AppState::Started {
        self.stop(&app_guid, &mut plan).await?;
      }
      return self.events.emit(Event::Complete, Vec::new(), &plan).await;
    }

    if plan.droplet_guid.is_none() {
      self.stage(&mut plan).await?;
    }

    match plan.strategy {
      DeploymentStrategy::Rolling => self.deploy(&app_guid, &mut plan).await?,
      DeploymentStrategy::Default => self.restart(&app_guid, &mut plan).await?,
    }

    self.events.emit(Event::Complete, Vec::new(), &plan).await
  }

  async fn ensure_application(&self, plan: &mut PushPlan) -> Result<String, Halt> {
    if let Some(guid) = plan.application.guid.clone() {
      self
        .events
        .emit(Event::SkippingApplicationCreation, Vec::new(), plan)
        .await?;
      return Ok(guid);
    }

    let mut stage = Stage::begin(self.events, Event::CreatingApplication, plan).await?;
    let reply = self
      .client
      .create_application(&plan.application.name, &plan.space_guid, plan.application.lifecycle)
      .await;
    let created = stage.settle(reply, plan).await?;

    plan.application.guid = Some(created.guid.clone());
    plan.application.state = created.state;
    stage.complete(Event::CreatedApplication, plan).await?;
    Ok(created.guid)
  }

  async fn map_routes(&self, app_guid: &str, plan: &PushPlan) -> Result<(), Halt> {
    let mut stage = Stage::begin(self.events, Event::CreatingAndMappingRoutes, plan).await?;
    let reply = self
      .client
      .create_and_map_default_route(app_guid, &plan.space_guid, plan.random_route)
      .await;
    stage.settle(reply, plan).await?;
    stage.complete(Event::CreatedRoutes, plan).await
  }

  async fn upload_bits(&self, app_guid: &str, plan: &mut PushPlan) -> Result<(), Halt> {
    if let Some(droplet_path) = plan.droplet_path.clone() {
      let mut stage = Stage::begin(self.events, Event::UploadingDroplet, plan).await?;
      let reply = self.client.upload_droplet(app_guid, &droplet_path).await;
      plan.droplet_guid = Some(stage.settle(reply, plan).await?);
      return stage.complete(Event::UploadDropletComplete, plan).await;
    }

    let mut stage = Stage::begin(self.events, Event::CreatingPackage, plan).await?;
    let reply = if plan.is_docker() {
      self
        .client
        .create_docker_package(app_guid, plan.docker_credentials.as_ref())
        .await
    } else {
      self.client.create_bits_package(app_guid).await
    };
    let package_guid = stage.settle(reply, plan).await?;
    plan.package_guid = Some(package_guid.clone());
    stage.complete(Event::CreatedPackage, plan).await?;

    if plan.is_docker() {
      return Ok(());
    }

    let mut stage = Stage::begin(self.events, Event::UploadingApplicationWithArchive, plan).await?;
    let reply = self
      .client
      .upload_bits_package(&package_guid, &plan.bits_path, plan.archive)
      .await;
    stage.settle(reply, plan).await?;
    stage.complete(Event::UploadWithArchiveComplete, plan).await
  }

  async fn stop(&self, app_guid: &str, plan: &mut PushPlan) -> Result<(), Halt> {
    let mut stage = Stage::begin(self.events, Event::StoppingApplication, plan).await?;
    let reply = self.client.stop_application(app_guid).await;
    stage.settle(reply, plan).await?;
    plan.application.state = AppState::Stopped;
    stage.complete(Event::StoppingApplicationComplete, plan).await
  }

  async fn stage(&self, plan: &mut PushPlan) -> Result<(), Halt> {
    let Some(package_guid) = plan.package_guid.clone() else {
      return Ok(());
    };

    let mut stage = Stage::begin(self.events, Event::StartingStaging, plan).await?;
    let timeout = self.config.staging_timeout;
    let droplet_guid = stage
      .settle_within(
        timeout,
        PushError::StagingTimeout(timeout),
        self.client.stage_package(&package_guid),
        plan,
      )
      .await?;
    plan.droplet_guid = Some(droplet_guid);
    stage.complete(Event::StagingComplete, plan).await
  }

  async fn deploy(&self, app_guid: &str, plan: &mut PushPlan) -> Result<(), Halt> {
    let droplet_guid = plan.droplet_guid.clone().unwrap_or_default();

    let mut stage = Stage::begin(self.events, Event::StartingDeployment, plan).await?;
    let reply = self.client.create_deployment(app_guid, &droplet_guid).await;
    let deployment_guid = stage.settle(reply, plan).await?;
    plan.deployment_guid = Some(deployment_guid.clone());

    if !plan.no_wait {
      let timeout = self.config.startup_timeout;
      stage
        .settle_within(
          timeout,
          PushError::StartupTimeout(timeout),
          self.client.wait_for_deployment(&deployment_guid),
          plan,
        )
        .await?;
    }

    plan.application.state = AppState::Started;
    stage.complete(Event::DeploymentComplete, plan).await
  }

  async fn restart(&self, app_guid: &str, plan: &mut PushPlan) -> Result<(), Halt> {
    if let Some(droplet_guid) = plan.droplet_guid.clone() {
      let mut stage = Stage::begin(self.events, Event::SettingDroplet, plan).await?;
      let reply = self.client.set_application_droplet(app_guid, &droplet_guid).await;
      stage.settle(reply, plan).await?;
      stage.complete(Event::SetDropletComplete, plan).await?;
    }

    let mut stage = Stage::begin(self.events, Event::RestartingApplication, plan).await?;
    let timeout = self.config.startup_timeout;
    stage
      .settle_within(
        timeout,
        PushError::StartupTimeout(timeout),
        self.client.restart_application(app_guid, plan.no_wait),
        plan,
      )
      .await?;
    plan.application.state = AppState::Started;
    stage.complete(Event::RestartingApplicationComplete, plan).await
  }
}
