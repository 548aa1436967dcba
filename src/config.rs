use crate::cli::Args;
use serde::{Deserialize, Serialize};

fn default_server_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_refresh_interval() -> u64 {
    5_000
}

fn default_history_page_size() -> u32 {
    20
}

fn default_recent_limit() -> u32 {
    5
}

fn default_request_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "ServerUrl", default = "default_server_url")]
    pub server_url: String,

    /// Base URL for detection images; falls back to the server URL.
    #[serde(rename = "MediaBaseUrl", default)]
    pub media_base_url: Option<String>,

    /// Poll interval in milliseconds.
    #[serde(rename = "RefreshInterval", default = "default_refresh_interval")]
    pub refresh_interval: u64,

    #[serde(rename = "HistoryPageSize", default = "default_history_page_size")]
    pub history_page_size: u32,

    #[serde(rename = "RecentLimit", default = "default_recent_limit")]
    pub recent_limit: u32,

    /// HTTP request timeout in seconds.
    #[serde(rename = "RequestTimeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            media_base_url: None,
            refresh_interval: default_refresh_interval(),
            history_page_size: default_history_page_size(),
            recent_limit: default_recent_limit(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".wastewatch");
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path)?;
                return Ok(toml::from_str(&content)?);
            }
        }

        Ok(Self::default())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".wastewatch");
            let content = toml::to_string_pretty(self)?;
            std::fs::write(config_path, content)?;
        }
        Ok(())
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(server) = &args.server {
            self.server_url = server.trim_end_matches('/').to_string();
        }
        if let Some(media_base) = &args.media_base {
            self.media_base_url = Some(media_base.trim_end_matches('/').to_string());
        }
        self.refresh_interval = args.refresh_interval;
        self.history_page_size = args.page_size;
        self.recent_limit = args.recent_limit;
        self.request_timeout = args.timeout;
    }

    #[must_use]
    pub fn media_base(&self) -> &str {
        self.media_base_url.as_deref().unwrap_or(&self.server_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.server_url, "http://localhost:8000");
        assert_eq!(config.refresh_interval, 5_000);
        assert_eq!(config.history_page_size, 20);
        assert_eq!(config.media_base(), "http://localhost:8000");
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config =
            toml::from_str("ServerUrl = \"http://192.168.1.20:8000\"\nRefreshInterval = 2000\n")
                .unwrap();
        assert_eq!(config.server_url, "http://192.168.1.20:8000");
        assert_eq!(config.refresh_interval, 2_000);
        assert_eq!(config.recent_limit, 5);
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.media_base_url = Some("http://cdn.local".to_string());
        let rendered = toml::to_string_pretty(&config).unwrap();
        let reparsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(reparsed.media_base(), "http://cdn.local");
    }

    #[test]
    fn args_override_config() {
        let mut config = Config::default();
        let args = Args {
            server: Some("http://10.0.0.5:8000/".to_string()),
            refresh_interval: 2_000,
            page_size: 50,
            recent_limit: 10,
            timeout: 5,
            ..Default::default()
        };

        config.apply_args(&args);

        assert_eq!(config.server_url, "http://10.0.0.5:8000");
        assert_eq!(config.refresh_interval, 2_000);
        assert_eq!(config.history_page_size, 50);
        assert_eq!(config.recent_limit, 10);
        assert_eq!(config.request_timeout, 5);
    }
}
