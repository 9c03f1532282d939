//! Folding command-line overrides into a parsed manifest.
//!
//! The pipeline has two phases:
//!
//! 1. **App selection** ([`transform_with_app_name`]) names or narrows the
//!    manifest to the application being pushed. It is the only step allowed
//!    to see more than one application.
//! 2. **Single-field transforms** ([`FLAG_TRANSFORMS`]) each apply one
//!    override to the sole remaining application, in a fixed order.
//!
//! Every transform takes the manifest by value and hands back the result, so
//! the pipeline is a plain left fold that stops at the first error.
//!
//! # Shared policy
//!
//! A single-field transform is a no-op when its override is unset. When set,
//! a manifest with more than one application is rejected with
//! [`TransformError::MultipleAppsOverride`]. Per-process fields land on the
//! `web` process entry if one exists, else on the application itself.

mod app_name;
mod flags;

use thiserror::Error;
use tracing::debug;

pub use app_name::transform_with_app_name;
pub use flags::*;

use super::overrides::FlagOverrides;
use crate::manifest::ParsedManifest;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
  #[error(
    "Incorrect Usage: Command line flags (except -f and --no-start) cannot be applied when pushing multiple apps from a manifest file."
  )]
  MultipleAppsOverride,

  #[error("Found an application with no name specified.")]
  NoName,

  #[error("Could not find app named '{name}' in manifest")]
  AppNotInManifest { name: String },
}

/// Signature shared by every transform.
pub type TransformFn = fn(ParsedManifest, &FlagOverrides) -> Result<ParsedManifest, TransformError>;

/// Single-field transforms in application order.
pub const FLAG_TRANSFORMS: &[(&str, TransformFn)] = &[
  ("buildpacks", with_buildpacks),
  ("stack", with_stack),
  ("disk", with_disk),
  ("memory", with_memory),
  ("instances", with_instances),
  ("start-command", with_start_command),
  ("health-check-type", with_health_check_type),
  ("health-check-endpoint", with_health_check_endpoint),
  ("health-check-timeout", with_health_check_timeout),
  ("docker-image", with_docker_image),
  ("docker-username", with_docker_username),
  ("no-route", with_no_route),
  ("random-route", with_random_route),
];

/// Run app selection, then every single-field transform.
pub fn transform_manifest(manifest: ParsedManifest, overrides: &FlagOverrides) -> Result<ParsedManifest, TransformError> {
  let manifest = transform_with_app_name(manifest, overrides)?;

  FLAG_TRANSFORMS
    .iter()
    .try_fold(manifest, |manifest, (name, transform)| {
      debug!(transform = name, "applying override");
      transform(manifest, overrides)
    })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::manifest::{Application, HealthCheckType, Manifest, Process, ProcessSettings};
  use tracing_test::traced_test;

  fn manifest(apps: Vec<Application>) -> ParsedManifest {
    ParsedManifest::from_manifest(Manifest { applications: apps })
  }

  fn sample() -> ParsedManifest {
    let mut app = Application::named("app");
    app.settings.memory = Some("256M".to_string());
    app.buildpacks = vec!["ruby_buildpack".to_string()];
    app.processes = vec![Process::new("worker"), Process::new("web")];
    manifest(vec![app])
  }

  /// One override of each kind, all valid together on a single app.
  fn every_override() -> FlagOverrides {
    FlagOverrides {
      buildpacks: Some(vec!["go_buildpack".to_string()]),
      stack: Some("cflinuxfs4".to_string()),
      disk: Some("1G".to_string()),
      memory: Some("512M".to_string()),
      instances: Some(3),
      start_command: Some("./server".to_string()),
      health_check_type: Some(HealthCheckType::Http),
      health_check_endpoint: Some("/health".to_string()),
      health_check_timeout: Some(30),
      docker_image: Some("nginx".to_string()),
      docker_username: Some("deployer".to_string()),
      no_route: true,
      ..Default::default()
    }
  }

  #[test]
  fn empty_overrides_are_identity() {
    let original = sample();
    let transformed = transform_manifest(original.clone(), &FlagOverrides::default()).unwrap();
    assert_eq!(transformed, original);

    let multi = manifest(vec![Application::named("a"), Application::named("b")]);
    let transformed = transform_manifest(multi.clone(), &FlagOverrides::default()).unwrap();
    assert_eq!(transformed, multi);
  }

  #[test]
  fn pipeline_order_is_fixed() {
    let names: Vec<&str> = FLAG_TRANSFORMS.iter().map(|(name, _)| *name).collect();
    assert_eq!(
      names,
      vec![
        "buildpacks",
        "stack",
        "disk",
        "memory",
        "instances",
        "start-command",
        "health-check-type",
        "health-check-endpoint",
        "health-check-timeout",
        "docker-image",
        "docker-username",
        "no-route",
        "random-route",
      ]
    );
  }

  #[test]
  fn applies_every_override_to_single_app() {
    let transformed = transform_manifest(sample(), &every_override()).unwrap();
    let app = &transformed.applications[0];
    let web = &app.processes[1].settings;

    assert_eq!(app.buildpacks, vec!["go_buildpack"]);
    assert_eq!(app.stack.as_deref(), Some("cflinuxfs4"));
    assert_eq!(web.disk_quota.as_deref(), Some("1G"));
    assert_eq!(web.memory.as_deref(), Some("512M"));
    assert_eq!(web.instances, Some(3));
    assert_eq!(web.command.as_deref(), Some("./server"));
    assert_eq!(web.health_check_type, Some(HealthCheckType::Http));
    assert_eq!(web.health_check_endpoint.as_deref(), Some("/health"));
    assert_eq!(web.health_check_timeout, Some(30));
    assert_eq!(app.docker.as_ref().and_then(|d| d.image.as_deref()), Some("nginx"));
    assert_eq!(app.docker.as_ref().and_then(|d| d.username.as_deref()), Some("deployer"));
    assert!(app.no_route);
    assert!(app.random_route);

    // Application-level memory and the worker process are untouched.
    assert_eq!(app.settings.memory.as_deref(), Some("256M"));
    assert_eq!(app.processes[0].settings, ProcessSettings::default());
  }

  #[test]
  fn pipeline_is_idempotent() {
    let overrides = every_override();
    let once = transform_manifest(sample(), &overrides).unwrap();
    let twice = transform_manifest(once.clone(), &overrides).unwrap();
    assert_eq!(twice, once);
  }

  #[test]
  fn app_name_narrows_before_single_field_transforms() {
    let multi = manifest(vec![Application::named("app-1"), Application::named("app-2")]);
    let overrides = FlagOverrides {
      app_name: Some("app-2".to_string()),
      memory: Some("1G".to_string()),
      ..Default::default()
    };

    let transformed = transform_manifest(multi, &overrides).unwrap();

    assert_eq!(transformed.app_names(), vec!["app-2"]);
    assert_eq!(transformed.applications[0].settings.memory.as_deref(), Some("1G"));
  }

  #[test]
  fn any_single_field_override_fails_on_multiple_apps() {
    let multi = manifest(vec![Application::named("app-1"), Application::named("app-2")]);

    for (name, transform) in FLAG_TRANSFORMS {
      let result = transform(multi.clone(), &every_override_with_random_route(name));
      assert_eq!(result, Err(TransformError::MultipleAppsOverride), "transform {name}");
    }

    let result = transform_manifest(multi, &every_override());
    assert_eq!(result, Err(TransformError::MultipleAppsOverride));
  }

  fn every_override_with_random_route(name: &str) -> FlagOverrides {
    if name == "random-route" {
      FlagOverrides {
        random_route: true,
        ..Default::default()
      }
    } else {
      every_override()
    }
  }

  #[test]
  fn first_error_short_circuits() {
    let unnamed = manifest(vec![Application::named("app-1"), Application::default()]);
    let overrides = FlagOverrides {
      memory: Some("1G".to_string()),
      ..Default::default()
    };

    assert_eq!(transform_manifest(unnamed, &overrides), Err(TransformError::NoName));
  }

  #[test]
  #[traced_test]
  fn logs_each_transform() {
    transform_manifest(sample(), &FlagOverrides::default()).unwrap();

    assert!(logs_contain("applying override"));
    assert!(logs_contain("random-route"));
  }
}
