use crate::calendar::{CalendarError, WorkCalendar, WorkCalendarConfig, WorkingDaysCalendar};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "OCCUPANCY_TOOL_CONFIG";
pub const HTTP_ADDR_ENV: &str = "OCCUPANCY_TOOL_HTTP_ADDR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid work calendar: {0}")]
    Calendar(#[from] CalendarError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_http_addr")]
    pub http_addr: String,
    /// SQLite file backing the ledger; writes go through when set.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// JSON ledger snapshot used to seed an empty store.
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
    #[serde(default)]
    pub reporting_year: Option<i32>,
    /// Explicit per-month table; takes precedence over `work_calendar`.
    #[serde(default)]
    pub working_days: Option<WorkingDaysCalendar>,
    #[serde(default)]
    pub work_calendar: Option<WorkCalendarConfig>,
}

fn default_http_addr() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            database_path: None,
            seed_path: None,
            reporting_year: None,
            working_days: None,
            work_calendar: None,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from `$OCCUPANCY_TOOL_CONFIG` (defaults when unset), then apply
    /// `$OCCUPANCY_TOOL_HTTP_ADDR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };
        if let Ok(addr) = std::env::var(HTTP_ADDR_ENV) {
            config.http_addr = addr;
        }
        Ok(config)
    }

    /// Working-days table configured for `year`, if any.
    pub fn working_days_for(&self, year: i32) -> Result<Option<WorkingDaysCalendar>, ConfigError> {
        if let Some(table) = self.working_days {
            return Ok(Some(table));
        }
        let Some(work_calendar) = &self.work_calendar else {
            return Ok(None);
        };
        let calendar = WorkCalendar::from_config(work_calendar, year)?;
        Ok(Some(WorkingDaysCalendar::from_work_calendar(&calendar, year)?))
    }
}
