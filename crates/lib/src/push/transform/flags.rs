//! Single-field override transforms.

use super::TransformError;
use crate::manifest::{Application, Docker, ParsedManifest};
use crate::push::overrides::FlagOverrides;

/// Apply `value` to the only application, or do nothing when it is unset.
fn override_single_app<T>(
  mut manifest: ParsedManifest,
  value: Option<T>,
  apply: impl FnOnce(&mut Application, T),
) -> Result<ParsedManifest, TransformError> {
  let Some(value) = value else {
    return Ok(manifest);
  };

  if manifest.contains_multiple_apps() {
    return Err(TransformError::MultipleAppsOverride);
  }

  if let Some(app) = manifest.applications.first_mut() {
    apply(app, value);
  }
  Ok(manifest)
}

fn docker_mut(app: &mut Application) -> &mut Docker {
  app.docker.get_or_insert_with(Docker::default)
}

/// Replace buildpacks, keeping the first occurrence of each.
pub fn with_buildpacks(manifest: ParsedManifest, overrides: &FlagOverrides) -> Result<ParsedManifest, TransformError> {
  override_single_app(manifest, overrides.buildpacks.as_ref(), |app, buildpacks| {
    let mut deduped: Vec<String> = Vec::with_capacity(buildpacks.len());
    for buildpack in buildpacks {
      if !deduped.contains(buildpack) {
        deduped.push(buildpack.clone());
      }
    }
    app.buildpacks = deduped;
  })
}

pub fn with_stack(manifest: ParsedManifest, overrides: &FlagOverrides) -> Result<ParsedManifest, TransformError> {
  override_single_app(manifest, overrides.stack.clone(), |app, stack| {
    app.stack = Some(stack);
  })
}

pub fn with_disk(manifest: ParsedManifest, overrides: &FlagOverrides) -> Result<ParsedManifest, TransformError> {
  override_single_app(manifest, overrides.disk.clone(), |app, disk| {
    app.web_settings_mut().disk_quota = Some(disk);
  })
}

pub fn with_memory(manifest: ParsedManifest, overrides: &FlagOverrides) -> Result<ParsedManifest, TransformError> {
  override_single_app(manifest, overrides.memory.clone(), |app, memory| {
    app.web_settings_mut().memory = Some(memory);
  })
}

pub fn with_instances(manifest: ParsedManifest, overrides: &FlagOverrides) -> Result<ParsedManifest, TransformError> {
  override_single_app(manifest, overrides.instances, |app, instances| {
    app.web_settings_mut().instances = Some(instances);
  })
}

pub fn with_start_command(
  manifest: ParsedManifest,
  overrides: &FlagOverrides,
) -> Result<ParsedManifest, TransformError> {
  override_single_app(manifest, overrides.start_command.clone(), |app, command| {
    app.web_settings_mut().command = Some(command);
  })
}

pub fn with_health_check_type(
  manifest: ParsedManifest,
  overrides: &FlagOverrides,
) -> Result<ParsedManifest, TransformError> {
  override_single_app(manifest, overrides.health_check_type, |app, check| {
    app.web_settings_mut().health_check_type = Some(check);
  })
}

pub fn with_health_check_endpoint(
  manifest: ParsedManifest,
  overrides: &FlagOverrides,
) -> Result<ParsedManifest, TransformError> {
  override_single_app(manifest, overrides.health_check_endpoint.clone(), |app, endpoint| {
    app.web_settings_mut().health_check_endpoint = Some(endpoint);
  })
}

pub fn with_health_check_timeout(
  manifest: ParsedManifest,
  overrides: &FlagOverrides,
) -> Result<ParsedManifest, TransformError> {
  override_single_app(manifest, overrides.health_check_timeout, |app, timeout| {
    app.web_settings_mut().health_check_timeout = Some(timeout);
  })
}

pub fn with_docker_image(manifest: ParsedManifest, overrides: &FlagOverrides) -> Result<ParsedManifest, TransformError> {
  override_single_app(manifest, overrides.docker_image.clone(), |app, image| {
    docker_mut(app).image = Some(image);
  })
}

pub fn with_docker_username(
  manifest: ParsedManifest,
  overrides: &FlagOverrides,
) -> Result<ParsedManifest, TransformError> {
  override_single_app(manifest, overrides.docker_username.clone(), |app, username| {
    docker_mut(app).username = Some(username);
  })
}

/// No route at all also rules out a random one being created.
pub fn with_no_route(manifest: ParsedManifest, overrides: &FlagOverrides) -> Result<ParsedManifest, TransformError> {
  override_single_app(manifest, overrides.no_route.then_some(()), |app, ()| {
    app.no_route = true;
    app.random_route = true;
  })
}

pub fn with_random_route(manifest: ParsedManifest, overrides: &FlagOverrides) -> Result<ParsedManifest, TransformError> {
  override_single_app(manifest, overrides.random_route.then_some(()), |app, ()| {
    app.random_route = true;
  })
}
