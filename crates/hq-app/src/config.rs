//! Application configuration (`hvacqual.yaml`).

use std::path::{Path, PathBuf};

use hq_criteria::CriteriaTable;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const CONFIG_FILE_NAME: &str = "hvacqual.yaml";

/// Overrides the data directory when set.
pub const HOME_ENV: &str = "HVACQUAL_HOME";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Blob store root: persisted reports and the file index.
    pub data_dir: PathBuf,
    /// Where generated documents are written.
    pub output_dir: PathBuf,
    /// Criteria table YAML; the built-in table is used when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".hvacqual/data"),
            output_dir: PathBuf::from(".hvacqual/exports"),
            criteria_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config YAML: {}", e)))
    }

    /// Load a config file; a missing file yields the defaults.
    ///
    /// Relative paths inside the file are taken relative to its directory.
    pub fn load(path: &Path) -> AppResult<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigRead {
                path: path.to_path_buf(),
                source: e,
            })?;
            Self::from_yaml_str(&content)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolved_against(base))
    }

    /// Load from a file and apply the `HVACQUAL_HOME` override from the environment.
    pub fn load_with_env(path: &Path) -> AppResult<Self> {
        let home = std::env::var_os(HOME_ENV).map(PathBuf::from);
        Ok(Self::load(path)?.with_home(home))
    }

    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        if let Some(home) = home
            && !home.as_os_str().is_empty()
        {
            self.data_dir = home;
        }
        self
    }

    pub fn resolved_against(mut self, base: &Path) -> Self {
        let resolve = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.data_dir = resolve(self.data_dir);
        self.output_dir = resolve(self.output_dir);
        self.criteria_path = self.criteria_path.map(resolve);
        self
    }

    pub fn to_yaml_string(&self) -> AppResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))
    }

    pub fn load_criteria(&self) -> AppResult<CriteriaTable> {
        match &self.criteria_path {
            Some(path) => Ok(CriteriaTable::load_yaml(path)?),
            None => Ok(CriteriaTable::default()),
        }
    }
}
