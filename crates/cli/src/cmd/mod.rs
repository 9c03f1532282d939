mod args;
mod manifest;
mod push;

pub use manifest::{ManifestArgs, cmd_manifest};
pub use push::{PushArgs, cmd_push};
