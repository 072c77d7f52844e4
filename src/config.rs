//! Process configuration read once from the environment

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";
pub const DEFAULT_PORT: u16 = 8000;

/// Configuration for the chat server and its remote session
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Gemini API key (`API_KEY`, falling back to `GEMINI_API_KEY`)
    pub api_key: Option<String>,
    /// Gateway URL that authenticates on our behalf (`LLM_GATEWAY`)
    pub gateway: Option<String>,
    pub model: String,
    pub system_prompt: String,
    pub port: u16,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            gateway: None,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();
        Self {
            api_key: get("API_KEY").or_else(|| get("GEMINI_API_KEY")),
            gateway: get("LLM_GATEWAY"),
            model: get("CHAT_MODEL").unwrap_or(defaults.model),
            system_prompt: get("CHAT_SYSTEM_PROMPT").unwrap_or(defaults.system_prompt),
            port: get("CHAT_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    /// Whether a credential (explicit key or gateway) is available
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some() || self.gateway.is_some()
    }
}
