use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub const DEFAULT_CONFIG_FILE: &str = "pathguard.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub validator: Validator,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Validator {
    #[serde(default)]
    pub allowed_base: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Logging {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}
fn default_level() -> String { "warn".to_string() }

impl Default for Logging {
    fn default() -> Self {
        Self { level: default_level(), format: LogFormat::default() }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    /// Loads `explicit` if given, else the default file when it exists, else defaults.
    pub fn discover(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() { Self::load(default) } else { Ok(Self::default()) }
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(base) = &self.validator.allowed_base {
            if base.as_os_str().is_empty() { anyhow::bail!("allowed_base must not be empty"); }
        }
        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            anyhow::bail!("invalid logging.level '{}': {e}", self.logging.level);
        }
        Ok(())
    }
}
