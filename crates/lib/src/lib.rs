//! deckhand-lib: manifest-driven application pushes
//!
//! This crate provides the pieces behind `deck push`:
//! - `manifest`: locating, interpolating, and parsing application manifests
//! - `interpolate`: `((variable))` substitution over YAML documents
//! - `push`: command-line overrides, push plans, and the push orchestrator
//! - `config`: timeouts and channel sizing for a push run

pub mod config;
pub mod interpolate;
pub mod manifest;
pub mod push;
pub mod util;
