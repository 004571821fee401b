//! Application update sequencing.
//!
//! ```text
//! Fetching → Validating → Diffing → Uploading → Finalizing → Done
//!     └──────────┴───────────┴──────────┴────────────┴──→ Failed
//! ```
//!
//! Validation runs before any mutating call. A containment failure therefore
//! leaves the remote side untouched: the only call issued is the initial
//! read-only fetch. Transport failures in later stages are returned as-is and
//! are never retried here.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};

use launchpad_core::{AppConfig, AppManifest, AppName, LocalBundle, ResourceDescriptor};

use crate::client::HostingClient;
use crate::error::SyncError;
use crate::resource_diff::UpdatePlan;
use crate::{bundle, containment, package, resource_diff};

/// States of a single update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStage {
    Fetching,
    Validating,
    Diffing,
    Uploading,
    Finalizing,
    Done,
    Failed,
}

impl fmt::Display for UpdateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UpdateStage::Fetching => "fetching",
            UpdateStage::Validating => "validating",
            UpdateStage::Diffing => "diffing",
            UpdateStage::Uploading => "uploading",
            UpdateStage::Finalizing => "finalizing",
            UpdateStage::Done => "done",
            UpdateStage::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Stop after Diffing: no upload, no configuration replace.
    pub dry_run: bool,
}

/// Outcome of a completed update (or dry run).
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub app: AppName,
    /// Server state after Finalizing, or the manifest that would be sent on a dry run.
    pub manifest: AppManifest,
    pub plan: UpdatePlan,
    /// Size of the transmitted archive; `None` on a dry run.
    pub package_bytes: Option<usize>,
    pub stages: Vec<UpdateStage>,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Pushes one local bundle to one named application.
pub struct AppUpdater<'a, C: HostingClient + ?Sized> {
    client: &'a C,
    config: &'a AppConfig,
    stages: Vec<UpdateStage>,
}

impl<'a, C: HostingClient + ?Sized> AppUpdater<'a, C> {
    pub fn new(client: &'a C, config: &'a AppConfig) -> Self {
        Self {
            client,
            config,
            stages: Vec::new(),
        }
    }

    /// States visited by the most recent [`update`](Self::update), in order.
    pub fn stages(&self) -> &[UpdateStage] {
        &self.stages
    }

    /// Run the full sequence against the application called `name`.
    pub fn update(
        &mut self,
        name: &AppName,
        options: UpdateOptions,
    ) -> Result<UpdateReport, SyncError> {
        self.stages.clear();
        let started_at = Utc::now();
        match self.run(name, options) {
            Ok((manifest, plan, package_bytes)) => {
                self.enter(UpdateStage::Done);
                tracing::info!(
                    "updated '{}': {} uploaded, {} reused{}",
                    name,
                    plan.uploads.len(),
                    plan.reused.len(),
                    if options.dry_run { " (dry run)" } else { "" }
                );
                Ok(UpdateReport {
                    app: name.clone(),
                    manifest,
                    plan,
                    package_bytes,
                    stages: self.stages.clone(),
                    dry_run: options.dry_run,
                    started_at,
                    finished_at: Utc::now(),
                })
            }
            Err(err) => {
                let failed_in = self.stages.last().copied();
                self.enter(UpdateStage::Failed);
                tracing::warn!(
                    "update of '{}' failed while {}: {}",
                    name,
                    failed_in.map(|s| s.to_string()).unwrap_or_default(),
                    err
                );
                Err(err)
            }
        }
    }

    fn run(
        &mut self,
        name: &AppName,
        options: UpdateOptions,
    ) -> Result<(AppManifest, UpdatePlan, Option<usize>), SyncError> {
        self.enter(UpdateStage::Fetching);
        let current = self.client.get_app(name)?;

        self.enter(UpdateStage::Validating);
        let local = bundle::scan(&self.config.path)?;
        containment::validate(local.root(), &local.entries)?;

        self.enter(UpdateStage::Diffing);
        let plan = self.plan(&local)?;
        let desired = self.config.apply_to(&current);

        if options.dry_run {
            return Ok((desired, plan, None));
        }

        self.enter(UpdateStage::Uploading);
        let upload = package::build(&local, &plan)?;
        self.client.upload_bundle(name, &upload)?;

        self.enter(UpdateStage::Finalizing);
        let manifest = self.client.replace_app(name, &desired)?;

        Ok((manifest, plan, Some(upload.len())))
    }

    fn plan(&self, local: &LocalBundle) -> Result<UpdatePlan, SyncError> {
        let candidates = resource_diff::descriptors(local.files());
        let known: HashSet<ResourceDescriptor> = self
            .client
            .query_known_resources(&candidates)?
            .into_iter()
            .collect();
        Ok(resource_diff::diff(local.files(), &known))
    }

    fn enter(&mut self, stage: UpdateStage) {
        tracing::debug!("update stage: {stage}");
        self.stages.push(stage);
    }
}
