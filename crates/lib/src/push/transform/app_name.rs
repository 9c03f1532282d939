use tracing::debug;

use super::TransformError;
use crate::manifest::ParsedManifest;
use crate::push::overrides::FlagOverrides;

/// Name or select the application being pushed.
///
/// - Multiple applications where any is unnamed fail with
///   [`TransformError::NoName`], with or without an override.
/// - Without an app name override the manifest passes through.
/// - A single application takes the override as its name.
/// - Multiple applications are reduced to the one matching the override,
///   or fail with [`TransformError::AppNotInManifest`].
pub fn transform_with_app_name(
  mut manifest: ParsedManifest,
  overrides: &FlagOverrides,
) -> Result<ParsedManifest, TransformError> {
  if manifest.contains_multiple_apps() && manifest.has_app_with_no_name() {
    return Err(TransformError::NoName);
  }

  let Some(name) = overrides.app_name.as_deref() else {
    return Ok(manifest);
  };

  if manifest.contains_multiple_apps() {
    let selected = manifest
      .application(name)
      .cloned()
      .ok_or_else(|| TransformError::AppNotInManifest { name: name.to_string() })?;

    debug!(app = name, "selected application from manifest");
    manifest.applications = vec![selected];
  } else if let Some(app) = manifest.applications.first_mut() {
    debug!(from = %app.name, to = name, "naming application");
    app.name = name.to_string();
  }

  Ok(manifest)
}
