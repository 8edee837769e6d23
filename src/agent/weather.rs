//! Weather specialization

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::conversational::{AgentProfile, ConversationalAgent};
use super::tools::{Tool, ToolError, ToolTable};
use crate::llm::{ChatModel, FunctionSpec};
use crate::protocol::{AgentCapabilities, AgentCard, AgentSkill};
use crate::weather::WeatherClient;

pub const WEATHER_AGENT_NAME: &str = "Weather Agent";

const INSTRUCTION: &str = "You are a helpful weather assistant. Respond clearly and concisely using only \
the information you have been provided in the conversation. Use the available weather \
functions to look up alerts and forecasts for US locations before answering.";

pub fn profile() -> AgentProfile {
    AgentProfile {
        name: WEATHER_AGENT_NAME.to_string(),
        instruction: INSTRUCTION.to_string(),
        temperature: Some(0.0),
        fallback: "I was unable to generate a response.".to_string(),
    }
}

/// Weather agent with the weather.gov functions wired in
pub fn weather_agent(
    model: Arc<dyn ChatModel>,
    client: Arc<WeatherClient>,
    max_iterations: usize,
) -> ConversationalAgent {
    ConversationalAgent::new(profile(), model).with_tools(tool_table(client), max_iterations)
}

pub fn tool_table(client: Arc<WeatherClient>) -> ToolTable {
    ToolTable::new()
        .with(Arc::new(AlertsTool {
            client: client.clone(),
        }))
        .with(Arc::new(ForecastTool {
            client: client.clone(),
        }))
        .with(Arc::new(CityForecastTool { client }))
}

/// Card advertised by the served weather agent
pub fn agent_card(url: impl Into<String>) -> AgentCard {
    AgentCard {
        name: WEATHER_AGENT_NAME.to_string(),
        description: Some("Helps with weather".to_string()),
        url: url.into(),
        version: "1.0.0".to_string(),
        protocol_version: None,
        default_input_modes: vec!["text".to_string()],
        default_output_modes: vec!["text".to_string()],
        capabilities: AgentCapabilities {
            streaming: false,
            push_notifications: false,
        },
        skills: vec![AgentSkill {
            id: "weather_search".to_string(),
            name: "Search weather".to_string(),
            description: "Helps with weather in city, or states".to_string(),
            tags: vec!["weather".to_string()],
            examples: vec!["weather in LA, CA".to_string()],
        }],
    }
}

struct AlertsTool {
    client: Arc<WeatherClient>,
}

#[derive(Deserialize)]
struct AlertsArgs {
    state: String,
}

#[async_trait]
impl Tool for AlertsTool {
    fn spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: "get_alerts".to_string(),
            description: "Get active weather alerts for a US state".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "state": {
                        "type": "string",
                        "description": "Two-letter US state code (e.g. CA, NY)"
                    }
                },
                "required": ["state"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<String, ToolError> {
        let args: AlertsArgs = serde_json::from_value(arguments)?;
        Ok(self.client.get_alerts(&args.state).await)
    }
}

struct ForecastTool {
    client: Arc<WeatherClient>,
}

#[derive(Deserialize)]
struct ForecastArgs {
    latitude: f64,
    longitude: f64,
}

#[async_trait]
impl Tool for ForecastTool {
    fn spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: "get_forecast".to_string(),
            description: "Get the weather forecast for a latitude/longitude".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "latitude": {
                        "type": "number",
                        "description": "Latitude between -90 and 90"
                    },
                    "longitude": {
                        "type": "number",
                        "description": "Longitude between -180 and 180"
                    }
                },
                "required": ["latitude", "longitude"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<String, ToolError> {
        let args: ForecastArgs = serde_json::from_value(arguments)?;
        Ok(self.client.get_forecast(args.latitude, args.longitude).await)
    }
}

struct CityForecastTool {
    client: Arc<WeatherClient>,
}

#[derive(Deserialize)]
struct CityArgs {
    city: String,
    state: String,
}

#[async_trait]
impl Tool for CityForecastTool {
    fn spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: "get_forecast_by_city".to_string(),
            description: "Get the weather forecast for a US city".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "City name"
                    },
                    "state": {
                        "type": "string",
                        "description": "Two-letter US state code"
                    }
                },
                "required": ["city", "state"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<String, ToolError> {
        let args: CityArgs = serde_json::from_value(arguments)?;
        Ok(self.client.get_forecast_by_city(&args.city, &args.state).await)
    }
}
