use crate::error::AssistError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_AGENT_ID: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Text,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPersona {
    pub id: String,
    pub name: String,
    pub description: String,
    pub system_instruction: String,
    pub model: String,
    pub capability: Capability,
    /// Grounds answers with web search results.
    #[serde(default)]
    pub search: bool,
}

impl AgentPersona {
    fn text(id: &str, name: &str, description: &str, system_instruction: &str, model: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            system_instruction: system_instruction.to_string(),
            model: model.to_string(),
            capability: Capability::Text,
            search: false,
        }
    }

    pub fn is_image(&self) -> bool {
        self.capability == Capability::Image
    }
}

/// Personas keyed by id. Always holds a `default` entry.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    personas: Vec<AgentPersona>,
    default_index: usize,
}

impl AgentRegistry {
    pub fn new(personas: Vec<AgentPersona>) -> Result<Self, AssistError> {
        let default_index = personas
            .iter()
            .position(|persona| persona.id == DEFAULT_AGENT_ID)
            .ok_or_else(|| AssistError::UnknownAgent(DEFAULT_AGENT_ID.to_string()))?;
        Ok(Self {
            personas,
            default_index,
        })
    }

    pub fn builtin() -> Self {
        let mut researcher = AgentPersona::text(
            "researcher",
            "Search",
            "Web Researcher",
            "You are a researcher. Use Google Search to find facts.",
            "gemini-3-pro-preview",
        );
        researcher.search = true;
        let memer = AgentPersona {
            capability: Capability::Image,
            ..AgentPersona::text(
                "memer",
                "MemeGen",
                "Visual Artist",
                "You are a creative visual artist. Create funny or relevant images based on the text.",
                "gemini-2.5-flash-image",
            )
        };

        Self {
            default_index: 0,
            personas: vec![
                AgentPersona::text(
                    DEFAULT_AGENT_ID,
                    "General",
                    "Helpful Assistant",
                    "You are AgentKey. Be concise and helpful.",
                    "gemini-3-flash-preview",
                ),
                AgentPersona::text(
                    "coder",
                    "DevBox",
                    "Senior Engineer",
                    "You are a Senior Software Engineer. Provide efficient, clean, and modern code solutions. Analyze bugs deeply.",
                    "gemini-3-pro-preview",
                ),
                AgentPersona::text(
                    "writer",
                    "CopyEditor",
                    "Content Polisher",
                    "You are a professional editor. Improve grammar, tone, and clarity. Make the text engaging.",
                    "gemini-3-flash-preview",
                ),
                researcher,
                memer,
            ],
        }
    }

    pub fn get(&self, id: &str) -> Option<&AgentPersona> {
        self.personas.iter().find(|persona| persona.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn default_persona(&self) -> &AgentPersona {
        &self.personas[self.default_index]
    }

    /// Looks up `id`, falling back to the default persona.
    pub fn resolve(&self, id: &str) -> &AgentPersona {
        self.get(id).unwrap_or_else(|| self.default_persona())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.personas.iter().map(|persona| persona.id.as_str())
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_has_default_and_personas() {
        let registry = AgentRegistry::builtin();
        assert_eq!(registry.default_persona().name, "General");
        assert!(registry.get("researcher").is_some_and(|p| p.search));
        assert!(registry.get("memer").is_some_and(AgentPersona::is_image));
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec!["default", "coder", "writer", "researcher", "memer"]
        );
    }

    #[test]
    fn test_unknown_ids_resolve_to_default() {
        let registry = AgentRegistry::builtin();
        assert_eq!(registry.resolve("nobody").id, DEFAULT_AGENT_ID);
        assert_eq!(registry.resolve("coder").name, "DevBox");
    }

    #[test]
    fn test_default_need_not_come_first() {
        let solo = AgentPersona::text("solo", "Solo", "", "", "m");
        let fallback = AgentPersona::text(DEFAULT_AGENT_ID, "Fallback", "", "", "m");
        let registry = AgentRegistry::new(vec![solo, fallback]).expect("has default");
        assert_eq!(registry.default_persona().name, "Fallback");
        assert_eq!(registry.resolve("nobody").name, "Fallback");
        assert_eq!(registry.resolve("solo").name, "Solo");
    }

    #[test]
    fn test_registry_without_default_is_rejected() {
        let persona = AgentPersona::text("solo", "Solo", "", "", "m");
        assert_eq!(
            AgentRegistry::new(vec![persona]).unwrap_err(),
            AssistError::UnknownAgent("default".to_string())
        );
    }
}
