//! Application manifest model, parsing, and lookup.
//!
//! Manifests are read from YAML, interpolated with push-time variables, and
//! resolved into the typed model that the override pipeline and push plans
//! work from.

mod error;
mod locator;
mod parser;
mod types;

pub use error::ManifestError;
pub use locator::{MANIFEST_FILENAMES, locate};
pub use parser::{ParsedManifest, interpolate_and_parse};
pub use types::*;
