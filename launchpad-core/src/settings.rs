//! Client settings persisted at `~/.launchpad/config.yaml`.
//!
//! # API pattern
//!
//! - `load_at(home)` / `save_at(home, …)` — explicit home; used in tests with `TempDir`
//! - `load()` / `save(…)` — derive home from `dirs::home_dir()`, delegate to `_at`
//!
//! Settings never come from ambient process state here. Overrides from flags
//! or environment variables are applied by the caller via [`ClientSettings::merge`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};

/// Target used when neither the settings file nor the caller names one.
pub const DEFAULT_TARGET: &str = "http://api.vcap.me";

/// Default per-request timeout handed to the transport.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSettings {
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            target: default_target(),
            token: None,
            proxy: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Overrides supplied on the command line. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub target: Option<String>,
    pub token: Option<String>,
    pub proxy: Option<String>,
}

impl ClientSettings {
    pub fn merge(mut self, overrides: SettingsOverrides) -> Self {
        if let Some(target) = overrides.target {
            self.target = target;
        }
        if overrides.token.is_some() {
            self.token = overrides.token;
        }
        if overrides.proxy.is_some() {
            self.proxy = overrides.proxy;
        }
        self
    }

    /// `target` without a trailing slash, with `http://` added when no scheme is given.
    pub fn target_url(&self) -> String {
        let trimmed = self.target.trim_end_matches('/');
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        }
    }
}

/// `<home>/.launchpad/config.yaml`. Pure, no I/O.
pub fn settings_path_at(home: &Path) -> PathBuf {
    home.join(".launchpad").join("config.yaml")
}

/// Load settings; a missing file yields [`ClientSettings::default`].
pub fn load_at(home: &Path) -> Result<ClientSettings, ConfigError> {
    let path = settings_path_at(home);
    if !path.exists() {
        return Ok(ClientSettings::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<ClientSettings, ConfigError> {
    load_at(&home()?)
}

/// Atomically save settings: `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, settings: &ClientSettings) -> Result<(), ConfigError> {
    let path = settings_path_at(home);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let tmp = path.with_extension("yaml.tmp");
    let yaml = serde_yaml::to_string(settings)?;
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(settings: &ClientSettings) -> Result<(), ConfigError> {
    save_at(&home()?, settings)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// The token is a credential; keep the file private.
#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}
