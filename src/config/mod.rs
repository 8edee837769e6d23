//! Switchboard configuration module
//! Handles loading, saving, and overriding the config file

pub mod config;

pub use config::{Config, HostConfig, LlmConfig, ServerConfig, WeatherConfig};
