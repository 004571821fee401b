//! # launchpad-http
//!
//! Blocking HTTP implementation of [`HostingClient`].
//!
//! | Operation | Request |
//! |---|---|
//! | get_app | `GET /apps/{name}` |
//! | query_known_resources | `POST /resources` (JSON descriptors) |
//! | upload_bundle | `POST /apps/{name}/application` (`application/gzip`) |
//! | replace_app | `PUT /apps/{name}` (JSON manifest) |
//!
//! Proxy and timeout come from [`TransportConfig`] only. The agent never
//! consults `http_proxy` / `https_proxy`. Requests are not retried.

use std::time::Duration;

use launchpad_core::{AppManifest, AppName, ClientSettings, ResourceDescriptor};
use launchpad_sync::{HostingClient, TransportError, UploadPackage};

/// Everything the transport needs; built from [`ClientSettings`] by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Base URL, no trailing slash.
    pub target: String,
    pub token: Option<String>,
    pub proxy: Option<String>,
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self {
            target: settings.target_url(),
            token: settings.token.clone(),
            proxy: settings.proxy.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// A [`HostingClient`] speaking HTTP to a single target.
pub struct HttpClient {
    agent: ureq::Agent,
    base: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let mut builder = ureq::AgentBuilder::new().timeout(config.timeout);
        if let Some(proxy) = &config.proxy {
            let proxy = ureq::Proxy::new(proxy)
                .map_err(|e| TransportError::Network(format!("invalid proxy '{proxy}': {e}")))?;
            builder = builder.proxy(proxy);
        }
        Ok(Self {
            agent: builder.build(),
            base: config.target.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    pub fn target(&self) -> &str {
        &self.base
    }

    fn app_url(&self, name: &AppName) -> String {
        format!("{}/apps/{}", self.base, urlencoding::encode(name.as_str()))
    }

    fn request(&self, method: &'static str, url: &str) -> ureq::Request {
        tracing::debug!("{method} {url}");
        let request = self
            .agent
            .request(method, url)
            .set("Accept", "application/json");
        match &self.token {
            Some(token) => request.set("Authorization", token),
            None => request,
        }
    }
}

impl HostingClient for HttpClient {
    fn get_app(&self, name: &AppName) -> Result<AppManifest, TransportError> {
        let url = self.app_url(name);
        let response = self.request("GET", &url).call().map_err(|e| match e {
            ureq::Error::Status(404, _) => TransportError::NotFound {
                name: name.to_string(),
            },
            other => map_err("GET", &url, other),
        })?;
        decode_json(response)
    }

    fn query_known_resources(
        &self,
        candidates: &[ResourceDescriptor],
    ) -> Result<Vec<ResourceDescriptor>, TransportError> {
        let url = format!("{}/resources", self.base);
        let response = self
            .request("POST", &url)
            .send_json(candidates)
            .map_err(|e| map_err("POST", &url, e))?;
        decode_json(response)
    }

    fn upload_bundle(&self, name: &AppName, package: &UploadPackage) -> Result<(), TransportError> {
        let url = format!("{}/application", self.app_url(name));
        self.request("POST", &url)
            .set("Content-Type", "application/gzip")
            .send_bytes(&package.archive)
            .map_err(|e| map_err("POST", &url, e))?;
        tracing::info!(
            "uploaded {} bytes to '{}' ({} files, {} links)",
            package.len(),
            name,
            package.files_included,
            package.links_included
        );
        Ok(())
    }

    fn replace_app(
        &self,
        name: &AppName,
        manifest: &AppManifest,
    ) -> Result<AppManifest, TransportError> {
        let url = self.app_url(name);
        let response = self
            .request("PUT", &url)
            .send_json(manifest)
            .map_err(|e| map_err("PUT", &url, e))?;
        let body = response
            .into_string()
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        // Some services acknowledge with an empty body.
        if body.trim().is_empty() {
            return Ok(manifest.clone());
        }
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

fn map_err(method: &'static str, url: &str, err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Status(status, response) => TransportError::Status {
            method,
            url: url.to_string(),
            status,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => TransportError::Network(transport.to_string()),
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(
    response: ureq::Response,
) -> Result<T, TransportError> {
    response
        .into_json()
        .map_err(|e| TransportError::Decode(e.to_string()))
}
