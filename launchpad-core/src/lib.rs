//! Launchpad core library — domain types, configuration files, errors.
//!
//! - [`types`] — application manifests, bundle entries, resource descriptors
//! - [`config`] — the per-application `launchpad.yml` file
//! - [`settings`] — client settings (`~/.launchpad/config.yaml`)
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod settings;
pub mod types;

pub use config::AppConfig;
pub use error::ConfigError;
pub use settings::ClientSettings;
pub use types::{
    AppManifest, AppName, AppState, BundleEntry, Environment, LocalBundle, ResourceDescriptor,
    Resources, Staging,
};
