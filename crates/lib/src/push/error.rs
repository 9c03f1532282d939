use std::time::Duration;

use thiserror::Error;

use super::client::ClientError;
use super::overrides::OverrideError;
use super::transform::TransformError;
use crate::manifest::ManifestError;

/// Errors that end a push.
///
/// Cloneable so that it can ride inside events; wrapped errors that are not
/// cloneable are kept as their rendered message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PushError {
  #[error(
    "Incorrect Usage: The push command requires an app name. The app name can be supplied as an argument or with a manifest.yml file."
  )]
  AppNameOrManifestRequired,

  #[error("no push plans to apply")]
  NoPushPlans,

  #[error(transparent)]
  Client(#[from] ClientError),

  #[error(transparent)]
  Override(#[from] OverrideError),

  #[error(transparent)]
  Transform(#[from] TransformError),

  #[error("{0}")]
  Manifest(String),

  #[error("failed to inspect application path {path}: {message}")]
  BitsPath { path: String, message: String },

  #[error("Timed out waiting for package to stage after {}", humantime::format_duration(*.0))]
  StagingTimeout(Duration),

  #[error("Timed out waiting for application to start after {}", humantime::format_duration(*.0))]
  StartupTimeout(Duration),
}

impl From<ManifestError> for PushError {
  fn from(err: ManifestError) -> Self {
    PushError::Manifest(err.to_string())
  }
}
