//! weather.gov and geocoding lookups
//!
//! Every lookup validates its inputs and returns a human-readable string;
//! invalid input, upstream failures and empty result sets all become text the
//! model can relay to the user.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::format::{format_alert, format_forecast_period};
use crate::config::WeatherConfig;

pub const INVALID_STATE_MESSAGE: &str =
    "Invalid input. Please provide a two-letter US state code (e.g., CA).";
pub const INVALID_COORDINATES_MESSAGE: &str = "Invalid latitude or longitude provided. Latitude must be between -90 and 90, Longitude between -180 and 180.";
pub const INVALID_CITY_MESSAGE: &str = "Invalid city name provided.";
pub const INVALID_CITY_STATE_MESSAGE: &str =
    "Invalid state code. Please provide the two-letter US state abbreviation (e.g., CA).";

const MAX_FORECAST_PERIODS: usize = 5;
const SEPARATOR: &str = "\n---\n";

/// Client for weather.gov and a Nominatim-compatible geocoder
pub struct WeatherClient {
    client: Client,
    api_base_url: String,
    geocode_url: String,
    geocode_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    lat: String,
    lon: String,
}

/// Outcome of a geocoding lookup
enum Geocode {
    Found(f64, f64),
    NotFound,
    TimedOut,
    ServiceError,
}

fn is_state_code(state: &str) -> bool {
    state.chars().count() == 2 && state.chars().all(|c| c.is_ascii_alphabetic())
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/geo+json"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            geocode_url: config.geocode_url.trim_end_matches('/').to_string(),
            geocode_timeout: Duration::from_secs(config.geocode_timeout_secs),
        }
    }

    /// Active alerts for a two-letter US state
    pub async fn get_alerts(&self, state: &str) -> String {
        if !is_state_code(state) {
            return INVALID_STATE_MESSAGE.to_string();
        }
        let state = state.to_uppercase();

        let Some(data) = self.get_json(&format!("/alerts/active/area/{}", state)).await else {
            return format!("Failed to retrieve weather alerts for {}.", state);
        };

        let features = data
            .get("features")
            .and_then(Value::as_array)
            .filter(|f| !f.is_empty());

        match features {
            Some(features) => features
                .iter()
                .map(format_alert)
                .collect::<Vec<_>>()
                .join(SEPARATOR),
            None => format!("No active weather alerts found for {}.", state),
        }
    }

    /// Forecast for a coordinate pair
    pub async fn get_forecast(&self, latitude: f64, longitude: f64) -> String {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return INVALID_COORDINATES_MESSAGE.to_string();
        }
        let point = format!("{:.4},{:.4}", latitude, longitude);

        let properties = self
            .get_json(&format!("/points/{}", point))
            .await
            .and_then(|data| data.get("properties").cloned());
        let Some(properties) = properties else {
            return format!("Unable to retrieve NWS gridpoint information for {}.", point);
        };

        let Some(forecast_url) = properties
            .get("forecast")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
        else {
            return format!("Could not find the NWS forecast endpoint for {}.", point);
        };

        let forecast = self
            .fetch_json(forecast_url)
            .await
            .and_then(|data| data.get("properties").cloned());
        let Some(forecast) = forecast else {
            return "Failed to retrieve detailed forecast data from NWS.".to_string();
        };

        match forecast
            .get("periods")
            .and_then(Value::as_array)
            .filter(|p| !p.is_empty())
        {
            Some(periods) => periods
                .iter()
                .take(MAX_FORECAST_PERIODS)
                .map(format_forecast_period)
                .collect::<Vec<_>>()
                .join(SEPARATOR),
            None => "No forecast periods found for this location from NWS.".to_string(),
        }
    }

    /// Forecast for a city, geocoded first
    pub async fn get_forecast_by_city(&self, city: &str, state: &str) -> String {
        if city.trim().is_empty() {
            return INVALID_CITY_MESSAGE.to_string();
        }
        if !is_state_code(state.trim()) {
            return INVALID_CITY_STATE_MESSAGE.to_string();
        }

        let city = city.trim();
        let state = state.trim().to_uppercase();

        match self.geocode(&format!("{}, {}, USA", city, state)).await {
            Geocode::Found(lat, lon) => self.get_forecast(lat, lon).await,
            Geocode::NotFound => format!(
                "Could not find coordinates for '{}, {}'. Please check the spelling or try a nearby city.",
                city, state
            ),
            Geocode::TimedOut => format!(
                "Could not get coordinates for '{}, {}': The location service timed out.",
                city, state
            ),
            Geocode::ServiceError => format!(
                "Could not get coordinates for '{}, {}': The location service returned an error.",
                city, state
            ),
        }
    }

    async fn geocode(&self, query: &str) -> Geocode {
        let url = format!("{}/search", self.geocode_url);
        debug!("Geocoding '{}'", query);

        let response = match self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .timeout(self.geocode_timeout)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Geocode::TimedOut,
            Err(e) => {
                warn!("Geocoding request failed: {}", e);
                return Geocode::ServiceError;
            }
        };

        if !response.status().is_success() {
            warn!("Geocoder returned {}", response.status());
            return Geocode::ServiceError;
        }

        let hits: Vec<GeocodeHit> = match response.json().await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Geocoder response was not understood: {}", e);
                return Geocode::ServiceError;
            }
        };

        match hits.first() {
            Some(hit) => match (hit.lat.parse::<f64>(), hit.lon.parse::<f64>()) {
                (Ok(lat), Ok(lon)) => Geocode::Found(lat, lon),
                _ => Geocode::ServiceError,
            },
            None => Geocode::NotFound,
        }
    }

    async fn get_json(&self, endpoint: &str) -> Option<Value> {
        self.fetch_json(&format!("{}{}", self.api_base_url, endpoint))
            .await
    }

    async fn fetch_json(&self, url: &str) -> Option<Value> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Weather request to {} failed: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Weather request to {} returned {}", url, response.status());
            return None;
        }

        response.json().await.ok()
    }
}
