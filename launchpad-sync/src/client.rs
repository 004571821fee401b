//! The seam between the engine and the hosting service.

use launchpad_core::{AppManifest, AppName, ResourceDescriptor};

use crate::error::TransportError;
use crate::package::UploadPackage;

/// The four operations the engine needs from an already-authenticated session.
///
/// Implementations own retries, timeouts and proxies. Every call blocks until
/// the service answers.
pub trait HostingClient {
    /// Fetch the current manifest of `name`.
    fn get_app(&self, name: &AppName) -> Result<AppManifest, TransportError>;

    /// Return the subset of `candidates` the service already stores.
    fn query_known_resources(
        &self,
        candidates: &[ResourceDescriptor],
    ) -> Result<Vec<ResourceDescriptor>, TransportError>;

    /// Transfer a packaged bundle to the application's upload endpoint.
    fn upload_bundle(&self, name: &AppName, package: &UploadPackage) -> Result<(), TransportError>;

    /// Replace the application's configuration with `manifest`.
    fn replace_app(
        &self,
        name: &AppName,
        manifest: &AppManifest,
    ) -> Result<AppManifest, TransportError>;
}
