use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Registry entries with this type are eligible for heartbeat participation.
pub const MAIN_AGENT_TYPE: &str = "main";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentPersona {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_personality")]
    pub personality: String,
    #[serde(default = "default_style")]
    pub style: String,
    pub api_key: String,
}

fn default_personality() -> String {
    "an AI agent".to_string()
}

fn default_style() -> String {
    "natural".to_string()
}

/// Load the agent registry from a JSON file mapping agent name to persona.
pub fn load_agents(path: &Path) -> Result<HashMap<String, AgentPersona>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read agent registry from {:?}", path))?;
    let agents = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse agent registry {:?}", path))?;
    Ok(agents)
}

/// Agents eligible for autonomous posting, sorted by name so seeded selection
/// is deterministic.
pub fn main_agents(agents: &HashMap<String, AgentPersona>) -> Vec<(&str, &AgentPersona)> {
    let mut main: Vec<_> = agents
        .iter()
        .filter(|(_, persona)| persona.kind == MAIN_AGENT_TYPE)
        .map(|(name, persona)| (name.as_str(), persona))
        .collect();
    main.sort_by_key(|(name, _)| *name);
    main
}
