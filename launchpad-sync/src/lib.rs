//! # launchpad-sync
//!
//! Application synchronization engine.
//!
//! Call [`update::AppUpdater::update`] to push a local bundle to a deployed
//! application, or [`env::clone_environment`] to copy environment variables
//! between two deployed applications. Both talk to the hosting service only
//! through the [`HostingClient`] trait.

pub mod bundle;
pub mod client;
pub mod containment;
pub mod env;
pub mod error;
pub mod package;
pub mod resource_diff;
pub mod update;

pub use client::HostingClient;
pub use error::{SyncError, TransportError};
pub use package::UploadPackage;
pub use resource_diff::UpdatePlan;
pub use update::{AppUpdater, UpdateOptions, UpdateReport, UpdateStage};
