//! In-memory hosting service that records every call it receives.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use launchpad_core::{
    AppManifest, AppName, AppState, Environment, ResourceDescriptor, Resources, Staging,
};
use launchpad_sync::{HostingClient, TransportError, UploadPackage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get(String),
    Query(usize),
    Upload(String),
    Replace(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Get,
    Query,
    Upload,
    Replace,
}

#[derive(Default)]
pub struct FakeService {
    apps: RefCell<HashMap<AppName, AppManifest>>,
    stored: RefCell<HashSet<ResourceDescriptor>>,
    calls: RefCell<Vec<Call>>,
    failure: RefCell<Option<(Op, TransportError)>>,
    last_upload: RefCell<Option<UploadPackage>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app(self, manifest: AppManifest) -> Self {
        self.apps
            .borrow_mut()
            .insert(manifest.name.clone(), manifest);
        self
    }

    pub fn with_stored(self, descriptors: impl IntoIterator<Item = ResourceDescriptor>) -> Self {
        self.stored.borrow_mut().extend(descriptors);
        self
    }

    /// Make every subsequent call of `op` fail with `err`.
    pub fn fail(&self, op: Op, err: TransportError) {
        *self.failure.borrow_mut() = Some((op, err));
    }

    pub fn app(&self, name: &str) -> AppManifest {
        self.apps
            .borrow()
            .get(&AppName::from(name))
            .cloned()
            .expect("app present")
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn last_upload(&self) -> Option<UploadPackage> {
        self.last_upload.borrow().clone()
    }

    pub fn gets(&self, name: &str) -> usize {
        self.count(|c| matches!(c, Call::Get(n) if n == name))
    }

    pub fn replaces(&self, name: &str) -> usize {
        self.count(|c| matches!(c, Call::Replace(n) if n == name))
    }

    pub fn uploads(&self, name: &str) -> usize {
        self.count(|c| matches!(c, Call::Upload(n) if n == name))
    }

    pub fn queries(&self) -> usize {
        self.count(|c| matches!(c, Call::Query(_)))
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    fn check(&self, op: Op) -> Result<(), TransportError> {
        match &*self.failure.borrow() {
            Some((failing, err)) if *failing == op => Err(err.clone()),
            _ => Ok(()),
        }
    }
}

impl HostingClient for FakeService {
    fn get_app(&self, name: &AppName) -> Result<AppManifest, TransportError> {
        self.calls.borrow_mut().push(Call::Get(name.to_string()));
        self.check(Op::Get)?;
        self.apps
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| TransportError::NotFound {
                name: name.to_string(),
            })
    }

    fn query_known_resources(
        &self,
        candidates: &[ResourceDescriptor],
    ) -> Result<Vec<ResourceDescriptor>, TransportError> {
        self.calls.borrow_mut().push(Call::Query(candidates.len()));
        self.check(Op::Query)?;
        let stored = self.stored.borrow();
        Ok(candidates
            .iter()
            .filter(|d| stored.contains(d))
            .cloned()
            .collect())
    }

    fn upload_bundle(&self, name: &AppName, package: &UploadPackage) -> Result<(), TransportError> {
        self.calls.borrow_mut().push(Call::Upload(name.to_string()));
        self.check(Op::Upload)?;
        self.stored
            .borrow_mut()
            .extend(package.manifest.iter().map(|r| ResourceDescriptor {
                fingerprint: r.fingerprint.clone(),
                size: r.size,
            }));
        *self.last_upload.borrow_mut() = Some(package.clone());
        Ok(())
    }

    fn replace_app(
        &self,
        name: &AppName,
        manifest: &AppManifest,
    ) -> Result<AppManifest, TransportError> {
        self.calls.borrow_mut().push(Call::Replace(name.to_string()));
        self.check(Op::Replace)?;
        let mut apps = self.apps.borrow_mut();
        if !apps.contains_key(name) {
            return Err(TransportError::NotFound {
                name: name.to_string(),
            });
        }
        apps.insert(name.clone(), manifest.clone());
        Ok(manifest.clone())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// `foo` as the service reports it before any update.
pub fn app_info(name: &str) -> AppManifest {
    AppManifest {
        name: AppName::from(name),
        staging: Staging {
            model: "nodejs/1.0".into(),
            stack: Some("nodejs".into()),
        },
        uris: vec![format!("{name}.vcap.me")],
        instances: 1,
        resources: Resources {
            memory: 64,
            disk: Some(2048),
            fds: Some(256),
        },
        state: AppState::Started,
        env: Environment::new(),
        ..Default::default()
    }
}

pub fn app_with_env(name: &str, pairs: &[(&str, &str)]) -> AppManifest {
    let mut app = app_info(name);
    app.env = pairs.iter().copied().collect();
    app
}

/// A node app whose only links point inside the bundle.
pub fn node_npm_bundle(root: &Path) {
    fs::create_dir_all(root.join("node_modules/.bin")).unwrap();
    fs::create_dir_all(root.join("node_modules/express/bin")).unwrap();
    fs::write(
        root.join("app.js"),
        "require('express').createServer().listen(process.env.VCAP_APP_PORT);\n",
    )
    .unwrap();
    fs::write(root.join("package.json"), r#"{"name":"foo","version":"0.0.1"}"#).unwrap();
    fs::write(root.join("node_modules/express/bin/express"), "#!/usr/bin/env node\n").unwrap();
    #[cfg(unix)]
    std::os::unix::fs::symlink(
        "../express/bin/express",
        root.join("node_modules/.bin/express"),
    )
    .unwrap();
}

/// A node app with one link reaching outside its root.
#[cfg(unix)]
pub fn external_link_bundle(root: &Path, outside: &Path) {
    fs::create_dir_all(root).unwrap();
    fs::write(root.join("app.js"), "console.log('hi');\n").unwrap();
    fs::write(outside.join("secret.txt"), "outside\n").unwrap();
    std::os::unix::fs::symlink(outside.join("secret.txt"), root.join("secret.txt")).unwrap();
}
