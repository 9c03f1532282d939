use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::interpolate::InterpolationError;

/// Errors that can occur while locating, reading, or re-serializing a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  /// Manifest file is missing or unreadable.
  #[error("failed to read manifest {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Vars file is missing or unreadable.
  #[error("failed to read vars file {}: {source}", path.display())]
  ReadVarsFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Manifest or vars file is not well-formed YAML.
  #[error("the file {} is invalid YAML: {source}", path.display())]
  InvalidYaml {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  /// Manifest is valid YAML but a field has the wrong shape or type.
  #[error("the file {} does not match the manifest schema: {source}", path.display())]
  Schema {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  /// Vars file parsed but is not a mapping of names to values.
  #[error("vars file {} must contain a mapping of variable names to values", path.display())]
  InvalidVarsFile { path: PathBuf },

  /// A `((variable))` could not be resolved.
  #[error("error interpolating manifest: {0}")]
  Interpolation(#[from] InterpolationError),

  #[error("must have at least one application")]
  NoApplications,

  /// Application `path` does not exist; carries the path as written.
  #[error("File not found locally, make sure the file exists at given path {}", path.display())]
  InvalidApplicationPath { path: PathBuf },

  #[error("failed to resolve application path {}: {source}", path.display())]
  ResolvePath {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to inspect manifest location {}: {source}", path.display())]
  Locate {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Could not find app named '{name}' in manifest")]
  AppNotInManifest { name: String },

  #[error("failed to serialize manifest: {0}")]
  Serialize(#[source] serde_yaml::Error),
}
