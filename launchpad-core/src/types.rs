//! Domain types shared by the engine, the transport and the CLI.
//!
//! Manifests are snapshots of server-owned state and serialize to the JSON
//! shape the hosting service speaks. Bundle types describe the local
//! application tree and are never mutated by the engine.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a deployed application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppName(pub String);

impl AppName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for AppName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AppName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Lifecycle state reported by the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppState {
    Started,
    #[default]
    Stopped,
    /// Any state string this client does not model; kept verbatim.
    Unknown(String),
}

impl From<String> for AppState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "STARTED" => AppState::Started,
            "STOPPED" => AppState::Stopped,
            _ => AppState::Unknown(s),
        }
    }
}

impl From<AppState> for String {
    fn from(state: AppState) -> Self {
        state.to_string()
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppState::Started => write!(f, "STARTED"),
            AppState::Stopped => write!(f, "STOPPED"),
            AppState::Unknown(other) => write!(f, "{other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Ordered environment-variable mapping.
///
/// On the wire this is a JSON array of `"KEY=value"` strings. Insertion order
/// is preserved; [`Environment::set`] replaces an existing key in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Environment(Vec<(String, String)>);

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Add `key`, or update its value if already present.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Remove `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl TryFrom<Vec<String>> for Environment {
    type Error = String;

    fn try_from(raw: Vec<String>) -> Result<Self, Self::Error> {
        let mut env = Environment::new();
        for entry in raw {
            let Some((key, value)) = entry.split_once('=') else {
                return Err(format!("environment entry '{entry}' is not KEY=value"));
            };
            env.set(key, value);
        }
        Ok(env)
    }
}

impl From<Environment> for Vec<String> {
    fn from(env: Environment) -> Self {
        env.0.into_iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Environment::new();
        for (k, v) in iter {
            env.set(k, v);
        }
        env
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Runtime/framework model used to stage the application.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Staging {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Resource limits. `memory` and `disk` are in megabytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resources {
    pub memory: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fds: Option<u64>,
}

/// Client-side snapshot of a deployed application's configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppManifest {
    pub name: AppName,
    #[serde(default)]
    pub staging: Staging,
    #[serde(default)]
    pub uris: Vec<String>,
    #[serde(default)]
    pub instances: u32,
    #[serde(default)]
    pub resources: Resources,
    #[serde(default)]
    pub state: AppState,
    #[serde(default)]
    pub env: Environment,
    /// Server fields this client does not model. Sent back untouched on replace.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Content the server may already store, independent of any application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub fingerprint: String,
    pub size: u64,
}

/// A single entry of a local bundle.
///
/// Regular files carry a SHA-256 fingerprint of their content. Symbolic links
/// carry their raw target instead and have an empty fingerprint and zero size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleEntry {
    /// Path relative to the bundle root.
    pub path: PathBuf,
    pub size: u64,
    pub fingerprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_target: Option<PathBuf>,
}

impl BundleEntry {
    pub fn file(path: impl Into<PathBuf>, size: u64, fingerprint: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size,
            fingerprint: fingerprint.into(),
            link_target: None,
        }
    }

    pub fn link(path: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: 0,
            fingerprint: String::new(),
            link_target: Some(target.into()),
        }
    }

    pub fn is_link(&self) -> bool {
        self.link_target.is_some()
    }

    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            fingerprint: self.fingerprint.clone(),
            size: self.size,
        }
    }
}

/// The local directory tree to deploy. Entries are sorted by relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalBundle {
    pub root: PathBuf,
    pub entries: Vec<BundleEntry>,
}

impl LocalBundle {
    pub fn new(root: impl Into<PathBuf>, mut entries: Vec<BundleEntry>) -> Self {
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            root: root.into(),
            entries,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Regular-file entries, the only ones subject to resource diffing.
    pub fn files(&self) -> impl Iterator<Item = &BundleEntry> {
        self.entries.iter().filter(|e| !e.is_link())
    }

    pub fn links(&self) -> impl Iterator<Item = &BundleEntry> {
        self.entries.iter().filter(|e| e.is_link())
    }

    pub fn total_size(&self) -> u64 {
        self.files().map(|e| e.size).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
