//! Progress notifications emitted while a push runs.

use std::fmt;

use serde::{Serialize, Serializer};

use super::client::Warnings;
use super::error::PushError;
use super::plan::PushPlan;

/// Stage tags, in the order a full push can emit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
  ApplyManifest,
  ApplyManifestComplete,
  SkippingApplicationCreation,
  CreatingApplication,
  CreatedApplication,
  CreatingAndMappingRoutes,
  CreatedRoutes,
  CreatingPackage,
  CreatedPackage,
  UploadingApplicationWithArchive,
  UploadWithArchiveComplete,
  UploadingDroplet,
  UploadDropletComplete,
  StoppingApplication,
  StoppingApplicationComplete,
  StartingStaging,
  StagingComplete,
  SettingDroplet,
  SetDropletComplete,
  RestartingApplication,
  RestartingApplicationComplete,
  StartingDeployment,
  DeploymentComplete,
  Complete,
}

impl fmt::Display for Event {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// One notification from the push worker.
///
/// An event with `error` set is the last one on its stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushEvent {
  pub event: Event,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub warnings: Warnings,
  #[serde(serialize_with = "serialize_error", skip_serializing_if = "Option::is_none")]
  pub error: Option<PushError>,
  pub plan: PushPlan,
}

impl PushEvent {
  pub fn is_error(&self) -> bool {
    self.error.is_some()
  }
}

fn serialize_error<S: Serializer>(error: &Option<PushError>, serializer: S) -> Result<S::Ok, S::Error> {
  match error {
    Some(err) => serializer.serialize_str(&err.to_string()),
    None => serializer.serialize_none(),
  }
}
