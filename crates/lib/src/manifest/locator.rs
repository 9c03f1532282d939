//! Finding the manifest file for a push.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::ManifestError;

/// File names searched, in order, when a directory is given.
pub const MANIFEST_FILENAMES: &[&str] = &["manifest.yml", "manifest.yaml"];

/// Resolve a file-or-directory argument to a manifest path.
///
/// A file is returned as-is. A directory is searched for
/// [`MANIFEST_FILENAMES`]. Returns `Ok(None)` when nothing is found, which
/// means the push proceeds without a manifest.
pub fn locate(path: &Path) -> Result<Option<PathBuf>, ManifestError> {
  let metadata = match fs::metadata(path) {
    Ok(metadata) => metadata,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(e) => {
      return Err(ManifestError::Locate {
        path: path.to_path_buf(),
        source: e,
      });
    }
  };

  if metadata.is_file() {
    return Ok(Some(path.to_path_buf()));
  }

  for name in MANIFEST_FILENAMES {
    let candidate = path.join(name);
    if candidate.is_file() {
      debug!(path = %candidate.display(), "found manifest");
      return Ok(Some(candidate));
    }
  }

  Ok(None)
}
