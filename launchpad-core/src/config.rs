//! Per-application configuration file (`launchpad.yml`).
//!
//! Only the fields listed on [`AppConfig`] are recognized. Anything else is a
//! parse error at load time rather than being silently ignored.
//!
//! ```yaml
//! name: foo
//! uris: [foo.vcap.me]
//! instances: 1
//! staging:
//!   model: nodejs/1.0
//! path: .
//! resources:
//!   memory: 64
//! env:
//!   NODE_ENV: production
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{io_err, ConfigError};
use crate::types::{AppManifest, AppName, Environment};

/// Default file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "launchpad.yml";

/// Staging section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagingConfig {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Resource section of the config file. Sizes are in megabytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcesConfig {
    pub memory: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fds: Option<u64>,
}

/// Desired configuration of a single application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub name: AppName,
    #[serde(default)]
    pub uris: Vec<String>,
    #[serde(default = "default_instances")]
    pub instances: u32,
    pub staging: StagingConfig,
    /// Bundle root. Relative paths are resolved against the config file's directory.
    #[serde(default = "default_path")]
    pub path: PathBuf,
    pub resources: ResourcesConfig,
    /// When present, replaces the remote environment on update, in file order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<EnvEntries>,
}

/// The `env:` mapping, in the order the file lists it.
///
/// Scalar values (`PORT: 3000`, `DEBUG: true`) are taken as their YAML text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvEntries(pub Vec<(String, String)>);

impl EnvEntries {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for EnvEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for EnvEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = EnvEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of variable names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<EnvEntries, A::Error> {
                let mut entries: Vec<(String, String)> = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, serde_yaml::Value>()? {
                    let value = match value {
                        serde_yaml::Value::String(s) => s,
                        serde_yaml::Value::Number(n) => n.to_string(),
                        serde_yaml::Value::Bool(b) => b.to_string(),
                        _ => {
                            return Err(de::Error::custom(format!(
                                "env `{key}` must be a string, number or boolean"
                            )))
                        }
                    };
                    match entries.iter_mut().find(|(k, _)| *k == key) {
                        Some(slot) => slot.1 = value,
                        None => entries.push((key, value)),
                    }
                }
                Ok(EnvEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

fn default_instances() -> u32 {
    1
}

fn default_path() -> PathBuf {
    PathBuf::from(".")
}

impl AppConfig {
    /// Parse and validate a config document. Relative `path` values stay relative.
    pub fn from_yaml(source: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(source).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, resolving the bundle root against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let mut config = Self::from_yaml(&contents, path)?;
        if config.path.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.path = base.join(&config.path);
        }
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.0.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "name",
                reason: "must not be empty".into(),
            });
        }
        if self.instances == 0 {
            return Err(ConfigError::Invalid {
                field: "instances",
                reason: "must be at least 1".into(),
            });
        }
        if self.staging.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "staging.model",
                reason: "must not be empty".into(),
            });
        }
        if self.resources.memory == 0 {
            return Err(ConfigError::Invalid {
                field: "resources.memory",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Overlay this configuration onto a fetched manifest.
    ///
    /// Server-owned fields (name, state, unmodelled extras) are kept from
    /// `current`. The environment is kept unless the config declares one.
    pub fn apply_to(&self, current: &AppManifest) -> AppManifest {
        let mut next = current.clone();
        next.uris = self.uris.clone();
        next.instances = self.instances;
        next.staging.model = self.staging.model.clone();
        if self.staging.stack.is_some() {
            next.staging.stack = self.staging.stack.clone();
        }
        next.resources.memory = self.resources.memory;
        if self.resources.disk.is_some() {
            next.resources.disk = self.resources.disk;
        }
        if self.resources.fds.is_some() {
            next.resources.fds = self.resources.fds;
        }
        if let Some(env) = &self.env {
            next.env = env.iter().collect::<Environment>();
        }
        next
    }
}
