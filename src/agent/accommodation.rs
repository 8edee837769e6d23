//! Accommodation search specialization

use std::sync::Arc;

use super::conversational::{AgentProfile, ConversationalAgent};
use crate::llm::ChatModel;
use crate::protocol::{AgentCapabilities, AgentCard, AgentSkill};

pub const ACCOMMODATION_AGENT_NAME: &str = "Airbnb Agent";

pub const SUPPORTED_CONTENT_TYPES: [&str; 2] = ["text", "text/plain"];

const INSTRUCTION: &str = "You are a specialized assistant for researching Airbnb accommodations. \
Always be explicit when you do not have live listing data. \
Provide thoughtful suggestions, outline assumptions, and recommend next steps \
the user can take on airbnb.com. Format answers using Markdown.";

pub fn profile() -> AgentProfile {
    AgentProfile {
        name: ACCOMMODATION_AGENT_NAME.to_string(),
        instruction: INSTRUCTION.to_string(),
        temperature: Some(0.2),
        fallback: "I'm sorry, I was unable to generate a response.".to_string(),
    }
}

pub fn accommodation_agent(model: Arc<dyn ChatModel>) -> ConversationalAgent {
    ConversationalAgent::new(profile(), model)
}

/// Card advertised by the served accommodation agent
pub fn agent_card(url: impl Into<String>) -> AgentCard {
    let modes: Vec<String> = SUPPORTED_CONTENT_TYPES.iter().map(|m| m.to_string()).collect();

    AgentCard {
        name: ACCOMMODATION_AGENT_NAME.to_string(),
        description: Some("Helps with searching accommodation".to_string()),
        url: url.into(),
        version: "1.0.0".to_string(),
        protocol_version: None,
        default_input_modes: modes.clone(),
        default_output_modes: modes,
        capabilities: AgentCapabilities {
            streaming: false,
            push_notifications: false,
        },
        skills: vec![AgentSkill {
            id: "airbnb_search".to_string(),
            name: "Search airbnb accommodation".to_string(),
            description: "Helps with accommodation search".to_string(),
            tags: vec!["airbnb accommodation".to_string()],
            examples: vec![
                "Please find a room in LA, CA, April 15, 2025, checkout date is april 18, 2 adults"
                    .to_string(),
            ],
        }],
    }
}
