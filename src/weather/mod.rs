//! Weather data module

pub mod client;
pub mod format;

pub use client::WeatherClient;
pub use format::{format_alert, format_forecast_period};
