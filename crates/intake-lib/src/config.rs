use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use intake_spec::ReportLayout;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const CONFIG_ENV: &str = "INTAKE_CONFIG";
pub const DATA_DIR_ENV: &str = "INTAKE_DATA_DIR";
pub const REMOTE_URL_ENV: &str = "INTAKE_REMOTE_URL";
pub const WEBHOOK_ENV: &str = "INTAKE_NOTIFY_WEBHOOK";
pub const ADMIN_EMAIL_ENV: &str = "INTAKE_ADMIN_EMAIL";
pub const COOLDOWN_ENV: &str = "INTAKE_COOLDOWN_SECS";

const FALLBACK_DATA_DIR: &str = ".avatar-intake";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("`{key}` is not a valid URL ({value}): {source}")]
    InvalidUrl {
        key: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("environment override {key}={value} is invalid")]
    InvalidOverride { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    pub cooldown_secs: u64,
    pub retention: usize,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 30,
            retention: 200,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
    pub remote_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
    pub admin_email: Option<String>,
    pub sender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub line_width: usize,
    pub lines_per_page: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let layout = ReportLayout::default();
        Self {
            line_width: layout.line_width,
            lines_per_page: layout.lines_per_page,
        }
    }
}

/// Runtime settings, read from `config.toml` and environment overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub submission: SubmissionConfig,
    pub storage: StorageConfig,
    pub notify: NotifyConfig,
    pub report: ReportConfig,
}

impl IntakeConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Loads config from `path`, `$INTAKE_CONFIG` or the per-user default location,
    /// then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Same as [`IntakeConfig::load`] with an explicit environment lookup.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| lookup(CONFIG_ENV).map(PathBuf::from));
        let mut config = match explicit {
            Some(path) => Self::read_file(&path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::read_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(DATA_DIR_ENV) {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(remote) = lookup(REMOTE_URL_ENV) {
            self.storage.remote_url = Some(remote);
        }
        if let Some(webhook) = lookup(WEBHOOK_ENV) {
            self.notify.webhook_url = Some(webhook);
        }
        if let Some(email) = lookup(ADMIN_EMAIL_ENV) {
            self.notify.admin_email = Some(email);
        }
        if let Some(raw) = lookup(COOLDOWN_ENV) {
            let secs = raw.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                key: COOLDOWN_ENV,
                value: raw.clone(),
            })?;
            self.submission.cooldown_secs = secs;
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.submission.cooldown_secs)
    }

    pub fn report_layout(&self) -> ReportLayout {
        ReportLayout::new(self.report.line_width, self.report.lines_per_page)
    }

    /// Directory holding local submissions, the fallback archive and drafts.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.storage.data_dir {
            return dir.clone();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(FALLBACK_DATA_DIR))
    }

    pub fn remote_url(&self) -> Result<Option<Url>, ConfigError> {
        parse_optional_url("storage.remote_url", self.storage.remote_url.as_deref())
    }

    pub fn webhook_url(&self) -> Result<Option<Url>, ConfigError> {
        parse_optional_url("notify.webhook_url", self.notify.webhook_url.as_deref())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "avatar-intake", "avatar-intake")
}

fn parse_optional_url(key: &'static str, raw: Option<&str>) -> Result<Option<Url>, ConfigError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    Url::parse(raw)
        .map(Some)
        .map_err(|source| ConfigError::InvalidUrl {
            key,
            value: raw.to_string(),
            source,
        })
}
