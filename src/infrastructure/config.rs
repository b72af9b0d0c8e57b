use crate::domain::filters::{DashboardFilters, TimeFrame, DEFAULT_MONTH};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewaySettings {
    pub url: String,
    pub api_key: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    #[serde(default = "default_month")]
    pub default_month: String,
    #[serde(default)]
    pub default_time_frame: TimeFrame,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            default_month: default_month(),
            default_time_frame: TimeFrame::default(),
        }
    }
}

impl DashboardSettings {
    pub fn default_filters(&self) -> DashboardFilters {
        DashboardFilters::new(self.default_time_frame, self.default_month.clone())
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_month() -> String {
    DEFAULT_MONTH.to_string()
}

/// Loads `config/dashboard.*`, overridden by `DASHBOARD__SECTION__KEY` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
