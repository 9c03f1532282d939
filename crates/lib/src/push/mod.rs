//! Turning a manifest plus flags into a running application.
//!
//! - [`overrides`]: the flags a user gave, and which combinations are valid
//! - [`transform`]: folding those flags into the parsed manifest
//! - [`plan`]: one push plan per application to push
//! - [`actor`]: the orchestrator that drives plans against a [`PlatformClient`]

pub mod actor;
pub mod client;
pub mod error;
pub mod event;
pub mod overrides;
pub mod plan;
pub mod transform;

#[cfg(test)]
pub mod testutil;

pub use actor::{EventStream, PushActor};
pub use client::{AppState, ClientError, Lifecycle, PlatformClient, RemoteApplication, Reply, Warnings};
pub use error::PushError;
pub use event::{Event, PushEvent};
pub use overrides::{DeploymentStrategy, FlagOverrides, OverrideError};
pub use plan::{AppRecord, DockerCredentials, PlanContext, PushPlan, create_push_plans};
pub use transform::{TransformError, transform_manifest};
