//! Human-readable rendering of weather.gov payloads

use serde_json::Value;

/// Read a field as display text, falling back when absent or null
fn field(props: &Value, key: &str, default: &str) -> String {
    match props.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Format one alert feature
pub fn format_alert(feature: &Value) -> String {
    let empty = Value::Null;
    let props = feature.get("properties").unwrap_or(&empty);

    format!(
        "Event: {}\nArea: {}\nSeverity: {}\nCertainty: {}\nUrgency: {}\nEffective: {}\nExpires: {}\nDescription: {}\nInstructions: {}",
        field(props, "event", "Unknown Event"),
        field(props, "areaDesc", "N/A"),
        field(props, "severity", "N/A"),
        field(props, "certainty", "N/A"),
        field(props, "urgency", "N/A"),
        field(props, "effective", "N/A"),
        field(props, "expires", "N/A"),
        field(props, "description", "No description provided.").trim(),
        field(props, "instruction", "No instructions provided.").trim(),
    )
}

/// Format one forecast period
pub fn format_forecast_period(period: &Value) -> String {
    format!(
        "{}:\n  Temperature: {}°{}\n  Wind: {} {}\n  Short Forecast: {}\n  Detailed Forecast: {}",
        field(period, "name", "Unknown Period"),
        field(period, "temperature", "N/A"),
        field(period, "temperatureUnit", "F"),
        field(period, "windSpeed", "N/A"),
        field(period, "windDirection", "N/A"),
        field(period, "shortForecast", "N/A"),
        field(period, "detailedForecast", "No detailed forecast provided.").trim(),
    )
}
