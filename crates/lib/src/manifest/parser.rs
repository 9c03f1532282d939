//! Reading, interpolating, and resolving manifest files.
//!
//! The flow for a manifest on disk:
//!
//! 1. Read the raw manifest bytes
//! 2. Merge vars files in order, then inline `NAME=VALUE` pairs
//! 3. Interpolate `((variables))` in strict mode
//! 4. Deserialize into the [`Manifest`] model
//! 5. Resolve each application `path` against the manifest's directory
//!
//! The interpolated document is kept verbatim as the full raw manifest.

use std::fs;
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::{debug, info};

use super::ManifestError;
use super::types::{Application, Manifest};
use crate::interpolate::{VarKv, Variables, interpolate};

/// A manifest plus what is known about where it came from.
///
/// Dereferences to [`Manifest`], so `parsed.applications` and the manifest
/// query helpers are available directly.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedManifest {
  manifest: Manifest,
  path_to_manifest: Option<PathBuf>,
  full_raw: Vec<u8>,
  has_parsed: bool,
}

impl ParsedManifest {
  /// Wrap an in-memory manifest that was not read from disk.
  pub fn from_manifest(manifest: Manifest) -> Self {
    Self {
      manifest,
      ..Self::default()
    }
  }

  /// Manifest used when pushing without one: a single unnamed application.
  ///
  /// The app name override is what gives this application its name.
  pub fn no_manifest() -> Self {
    Self::from_manifest(Manifest {
      applications: vec![Application::default()],
    })
  }

  /// Whether this manifest was read from a file.
  pub fn contains_manifest(&self) -> bool {
    self.has_parsed
  }

  pub fn path_to_manifest(&self) -> Option<&Path> {
    self.path_to_manifest.as_deref()
  }

  /// The interpolated document as read, including fields the model ignores.
  pub fn full_raw_manifest(&self) -> &[u8] {
    &self.full_raw
  }

  pub fn into_manifest(self) -> Manifest {
    self.manifest
  }

  /// Serialize the model back to YAML.
  pub fn raw_manifest(&self) -> Result<Vec<u8>, ManifestError> {
    serde_yaml::to_string(&self.manifest)
      .map(String::into_bytes)
      .map_err(ManifestError::Serialize)
  }

  /// Serialize a single-application manifest for `name`.
  pub fn raw_app_manifest(&self, name: &str) -> Result<Vec<u8>, ManifestError> {
    let app = self
      .manifest
      .application(name)
      .ok_or_else(|| ManifestError::AppNotInManifest { name: name.to_string() })?;

    let single = Manifest {
      applications: vec![app.clone()],
    };
    serde_yaml::to_string(&single)
      .map(String::into_bytes)
      .map_err(ManifestError::Serialize)
  }
}

impl Deref for ParsedManifest {
  type Target = Manifest;

  fn deref(&self) -> &Self::Target {
    &self.manifest
  }
}

impl DerefMut for ParsedManifest {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.manifest
  }
}

/// Read the manifest at `path`, interpolate variables, and parse it.
///
/// # Arguments
///
/// * `path` - Path to the manifest file
/// * `vars_files` - Vars files, merged in order (later files win)
/// * `vars` - Inline variables, applied last (highest precedence)
///
/// # Errors
///
/// - [`ManifestError::Read`] / [`ManifestError::ReadVarsFile`] for unreadable files
/// - [`ManifestError::InvalidYaml`] / [`ManifestError::InvalidVarsFile`] for malformed data
/// - [`ManifestError::Schema`] when the document does not fit the manifest model
/// - [`ManifestError::Interpolation`] when a variable does not resolve
/// - [`ManifestError::NoApplications`] for an empty manifest
/// - [`ManifestError::InvalidApplicationPath`] when an app `path` does not exist
pub fn interpolate_and_parse(
  path: &Path,
  vars_files: &[PathBuf],
  vars: &[VarKv],
) -> Result<ParsedManifest, ManifestError> {
  info!(manifest = %path.display(), "reading manifest");

  let raw = fs::read(path).map_err(|e| ManifestError::Read {
    path: path.to_path_buf(),
    source: e,
  })?;

  let variables = load_variables(vars_files, vars)?;
  debug!(count = variables.len(), "loaded manifest variables");

  let document: Value = serde_yaml::from_slice(&raw).map_err(|e| ManifestError::InvalidYaml {
    path: path.to_path_buf(),
    source: e,
  })?;
  let document = interpolate(document, &variables)?;

  let full_raw = serde_yaml::to_string(&document)
    .map(String::into_bytes)
    .map_err(ManifestError::Serialize)?;

  let mut manifest = match document {
    Value::Null => Manifest::default(),
    document => serde_yaml::from_value::<Manifest>(document).map_err(|e| ManifestError::Schema {
      path: path.to_path_buf(),
      source: e,
    })?,
  };

  if manifest.applications.is_empty() {
    return Err(ManifestError::NoApplications);
  }

  let manifest_dir = path.parent().unwrap_or_else(|| Path::new(""));
  resolve_app_paths(&mut manifest, manifest_dir)?;

  debug!(apps = ?manifest.app_names(), "parsed manifest");

  Ok(ParsedManifest {
    manifest,
    path_to_manifest: Some(path.to_path_buf()),
    full_raw,
    has_parsed: true,
  })
}

/// Build the substitution table: vars files in order, then inline pairs.
fn load_variables(vars_files: &[PathBuf], vars: &[VarKv]) -> Result<Variables, ManifestError> {
  let mut variables = Variables::new();

  for path in vars_files {
    let raw = fs::read(path).map_err(|e| ManifestError::ReadVarsFile {
      path: path.clone(),
      source: e,
    })?;

    let parsed: Value = serde_yaml::from_slice(&raw).map_err(|e| ManifestError::InvalidYaml {
      path: path.clone(),
      source: e,
    })?;

    match parsed {
      Value::Mapping(mapping) => variables.merge(mapping),
      Value::Null => {}
      _ => return Err(ManifestError::InvalidVarsFile { path: path.clone() }),
    }
  }

  for kv in vars {
    variables.set(kv.clone());
  }

  Ok(variables)
}

/// Make every application `path` absolute with symlinks resolved.
fn resolve_app_paths(manifest: &mut Manifest, manifest_dir: &Path) -> Result<(), ManifestError> {
  for app in &mut manifest.applications {
    let Some(path) = app.path.clone() else {
      continue;
    };

    let joined = if path.is_absolute() {
      path.clone()
    } else {
      manifest_dir.join(&path)
    };

    match dunce::canonicalize(&joined) {
      Ok(resolved) => app.path = Some(resolved),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Err(ManifestError::InvalidApplicationPath { path });
      }
      Err(e) => {
        return Err(ManifestError::ResolvePath {
          path: joined,
          source: e,
        });
      }
    }
  }

  Ok(())
}
