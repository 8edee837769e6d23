//! Switchboard configuration management
//! Handles loading and saving the config file, plus environment overrides

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Switchboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// LLM endpoint and model selection
    #[serde(default)]
    pub llm: LlmConfig,

    /// Routing host settings
    #[serde(default)]
    pub host: HostConfig,

    /// Weather agent server
    #[serde(default = "default_weather_server")]
    pub weather_agent: ServerConfig,

    /// Accommodation agent server
    #[serde(default = "default_accommodation_server")]
    pub accommodation_agent: ServerConfig,

    /// Weather data sources
    #[serde(default)]
    pub weather: WeatherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            host: HostConfig::default(),
            weather_agent: default_weather_server(),
            accommodation_agent: default_accommodation_server(),
            weather: WeatherConfig::default(),
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Name of the env var holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_router_model")]
    pub router_model: String,
    #[serde(default = "default_agent_model")]
    pub weather_model: String,
    #[serde(default = "default_agent_model")]
    pub accommodation_model: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_router_model() -> String {
    "gpt-5-nano".to_string()
}

fn default_agent_model() -> String {
    "gpt-5-mini".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key_env: default_api_key_env(),
            router_model: default_router_model(),
            weather_model: default_agent_model(),
            accommodation_model: default_agent_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Routing host configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Base addresses of remote agents to discover at startup
    #[serde(default = "default_remote_agents")]
    pub remote_agents: Vec<String>,
    /// Session used by the interactive chat
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

pub const DEFAULT_ACCOMMODATION_URL: &str = "http://localhost:10002";
pub const DEFAULT_WEATHER_URL: &str = "http://localhost:10001";

fn default_remote_agents() -> Vec<String> {
    vec![
        DEFAULT_ACCOMMODATION_URL.to_string(),
        DEFAULT_WEATHER_URL.to_string(),
    ]
}

fn default_session_id() -> String {
    "default_session".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            remote_agents: default_remote_agents(),
            session_id: default_session_id(),
        }
    }
}

/// Server configuration for a served agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_weather_port")]
    pub port: u16,
    /// URL advertised in the agent card; derived from host/port when unset
    #[serde(default)]
    pub public_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_weather_port() -> u16 {
    10001
}

fn default_weather_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_weather_port(),
        public_url: None,
    }
}

fn default_accommodation_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: 10002,
        public_url: None,
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        default_weather_server()
    }
}

impl ServerConfig {
    /// Address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL published in the agent card
    pub fn card_url(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host, self.port))
    }
}

/// Weather data source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_api")]
    pub api_base_url: String,
    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_geocode_timeout")]
    pub geocode_timeout_secs: u64,
    /// Upper bound on model calls per weather turn when tools are in play
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,
}

fn default_weather_api() -> String {
    "https://api.weather.gov".to_string()
}

fn default_geocode_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    "weather-agent".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

fn default_geocode_timeout() -> u64 {
    10
}

fn default_max_tool_iterations() -> usize {
    8
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_weather_api(),
            geocode_url: default_geocode_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            geocode_timeout_secs: default_geocode_timeout(),
            max_tool_iterations: default_max_tool_iterations(),
        }
    }
}

impl Config {
    /// Load config from the default location or specified path
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = Self::config_path(path)?;

        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Config::default();
            config.save(path)?;
            return Ok(config);
        }

        let raw = fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&raw).context("Failed to parse config file")?;

        debug!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    /// Save config to the default location or specified path
    pub fn save(&self, path: Option<&str>) -> Result<()> {
        let config_path = Self::config_path(path)?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(&self)?;
        fs::write(&config_path, content).context("Failed to write config file")?;

        info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Get the config file path
    fn config_path(path: Option<&str>) -> Result<PathBuf> {
        // Check env override first
        if let Ok(env_path) = std::env::var("SWITCHBOARD_CONFIG") {
            return Ok(PathBuf::from(env_path));
        }

        if let Some(p) = path {
            return Ok(PathBuf::from(p));
        }

        let home = dirs::home_dir().context("Cannot find home directory")?;
        Ok(home.join(".switchboard").join("config.yml"))
    }

    /// Apply process environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("AIR_AGENT_URL") {
            replace_address(&mut self.host.remote_agents, DEFAULT_ACCOMMODATION_URL, url);
        }
        if let Some(url) = var("WEA_AGENT_URL") {
            replace_address(&mut self.host.remote_agents, DEFAULT_WEATHER_URL, url);
        }

        if let Some(base_url) = var("OPENAI_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Some(model) = var("OPENAI_MODEL") {
            self.llm.router_model = model.clone();
            self.llm.weather_model = model.clone();
            self.llm.accommodation_model = model;
        }
        if let Some(model) = var("OPENAI_ROUTER_MODEL") {
            self.llm.router_model = model;
        }
        if let Some(model) = var("OPENAI_WEATHER_MODEL") {
            self.llm.weather_model = model;
        }
        if let Some(model) = var("OPENAI_AIRBNB_MODEL") {
            self.llm.accommodation_model = model;
        }

        if let Some(url) = var("APP_URL") {
            self.weather_agent.public_url = Some(url.clone());
            self.accommodation_agent.public_url = Some(url);
        }
    }
}

fn replace_address(addresses: &mut Vec<String>, default: &str, replacement: String) {
    match addresses.iter_mut().find(|a| a.as_str() == default) {
        Some(slot) => *slot = replacement,
        None => {
            if !addresses.contains(&replacement) {
                addresses.push(replacement);
            }
        }
    }
}
