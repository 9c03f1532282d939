//! Test utilities for deckhand-lib.
//!
//! Helpers for laying out manifests and app directories on disk.

use std::fs;
use std::path::{Path, PathBuf};

/// Write `content` to `root/name`, creating parent directories.
pub fn write_file(root: &Path, name: &str, content: &str) -> PathBuf {
  let path = root.join(name);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(&path, content).unwrap();
  path
}

/// Write a `manifest.yml` declaring the given app names and return its path.
pub fn write_manifest(root: &Path, apps: &[&str]) -> PathBuf {
  let mut content = String::from("applications:\n");
  for app in apps {
    content.push_str(&format!("- name: {app}\n"));
  }
  write_file(root, "manifest.yml", &content)
}
