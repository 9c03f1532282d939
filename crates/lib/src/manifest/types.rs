//! Manifest types for deckhand.
//!
//! The manifest is the declarative description of one or more applications
//! to push. It's read from YAML, interpolated, and then folded together with
//! command-line overrides before anything is sent to the platform.
//!
//! # Structure
//!
//! ```yaml
//! applications:
//! - name: web-app
//!   memory: 256M
//!   buildpacks: [ruby_buildpack]
//!   processes:
//!   - type: web
//!     instances: 2
//!   - type: worker
//!     command: bundle exec sidekiq
//! ```
//!
//! # Ordering
//!
//! Applications keep their file order; the first entry is the implicit
//! target when no app name is given. Processes keep their file order too.
//!
//! # Round-tripping
//!
//! The model is a filtered view of the file: fields it knows about survive
//! serialization unchanged, anything else is dropped.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// Process type that most overrides target.
pub const WEB_PROCESS: &str = "web";

/// The complete manifest document.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
  #[serde(default)]
  pub applications: Vec<Application>,
}

impl Manifest {
  /// Names of all applications, in manifest order.
  pub fn app_names(&self) -> Vec<&str> {
    self.applications.iter().map(|app| app.name.as_str()).collect()
  }

  pub fn contains_multiple_apps(&self) -> bool {
    self.applications.len() > 1
  }

  pub fn has_app_with_no_name(&self) -> bool {
    self.applications.iter().any(|app| app.name.is_empty())
  }

  /// Whether any application pulls a docker image that needs credentials.
  pub fn contains_private_docker_images(&self) -> bool {
    self
      .applications
      .iter()
      .any(|app| app.docker.as_ref().is_some_and(|d| d.username.is_some()))
  }

  pub fn application(&self, name: &str) -> Option<&Application> {
    self.applications.iter().find(|app| app.name == name)
  }
}

/// Settings shared by an application and each of its processes.
///
/// Flattened into both [`Application`] and [`Process`], so the YAML keys sit
/// directly on the application or process entry.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSettings {
  #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
  pub command: Option<String>,

  #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
  pub disk_quota: Option<String>,

  #[serde(
    default,
    rename = "health-check-http-endpoint",
    deserialize_with = "scalar_string",
    skip_serializing_if = "Option::is_none"
  )]
  pub health_check_endpoint: Option<String>,

  #[serde(default, rename = "health-check-type", skip_serializing_if = "Option::is_none")]
  pub health_check_type: Option<HealthCheckType>,

  /// Seconds allowed for a single health check invocation.
  #[serde(
    default,
    rename = "health-check-invocation-timeout",
    skip_serializing_if = "Option::is_none"
  )]
  pub health_check_timeout: Option<u64>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub instances: Option<u32>,

  #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
  pub memory: Option<String>,
}

/// One application entry in the manifest.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
  /// May be empty until overrides supply a name.
  #[serde(default, deserialize_with = "scalar_name")]
  pub name: String,

  #[serde(flatten)]
  pub settings: ProcessSettings,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub buildpacks: Vec<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub docker: Option<Docker>,

  #[serde(default, rename = "no-route", skip_serializing_if = "is_false")]
  pub no_route: bool,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<PathBuf>,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub processes: Vec<Process>,

  #[serde(default, rename = "random-route", skip_serializing_if = "is_false")]
  pub random_route: bool,

  #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
  pub stack: Option<String>,
}

impl Application {
  /// Create an application with just a name.
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  /// Index of the `web` process entry, if the manifest declares one.
  pub fn web_process_index(&self) -> Option<usize> {
    self.processes.iter().position(|p| p.process_type == WEB_PROCESS)
  }

  /// Settings that web-targeted overrides write to.
  ///
  /// This is the `web` process entry when one exists, otherwise the
  /// application-level settings. Other process types are never returned.
  pub fn web_settings_mut(&mut self) -> &mut ProcessSettings {
    match self.web_process_index() {
      Some(index) => &mut self.processes[index].settings,
      None => &mut self.settings,
    }
  }

  pub fn is_docker(&self) -> bool {
    self.docker.as_ref().is_some_and(|d| d.image.is_some())
  }
}

/// A process-level entry, keyed by its type.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
  #[serde(rename = "type")]
  pub process_type: String,

  #[serde(flatten)]
  pub settings: ProcessSettings,
}

impl Process {
  pub fn new(process_type: impl Into<String>) -> Self {
    Self {
      process_type: process_type.into(),
      settings: ProcessSettings::default(),
    }
  }
}

/// Docker image source for an application.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Docker {
  #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,

  #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
  pub username: Option<String>,
}

/// How the platform decides an instance is healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthCheckType {
  Port,
  Process,
  Http,
}

impl HealthCheckType {
  pub fn as_str(&self) -> &'static str {
    match self {
      HealthCheckType::Port => "port",
      HealthCheckType::Process => "process",
      HealthCheckType::Http => "http",
    }
  }
}

impl fmt::Display for HealthCheckType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for HealthCheckType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "port" => Ok(HealthCheckType::Port),
      "process" => Ok(HealthCheckType::Process),
      "http" => Ok(HealthCheckType::Http),
      other => Err(format!("invalid health check type '{other}' (expected port, process, or http)")),
    }
  }
}

fn is_false(value: &bool) -> bool {
  !*value
}

/// Accept any YAML scalar for a text field, keeping its written form.
///
/// `memory: 256` and `stack: 22` read as `"256"` and `"22"`. Null is
/// treated as unset; mappings and sequences are rejected.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
  match Value::deserialize(deserializer)? {
    Value::Null => Ok(None),
    Value::String(s) => Ok(Some(s)),
    Value::Number(n) => Ok(Some(n.to_string())),
    Value::Bool(b) => Ok(Some(b.to_string())),
    Value::Sequence(_) => Err(de::Error::invalid_type(Unexpected::Seq, &"a string")),
    Value::Mapping(_) => Err(de::Error::invalid_type(Unexpected::Map, &"a string")),
    Value::Tagged(_) => Err(de::Error::invalid_type(Unexpected::Other("tagged value"), &"a string")),
  }
}

fn scalar_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
  Ok(scalar_string(deserializer)?.unwrap_or_default())
}
