use crate::error::{KonspektError, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    Grok,
    Openai,
    #[default]
    Gemini,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub default_model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                default_model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                default_model: "gpt-5.1",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                default_model: "gemini-3-flash",
                env_var: "GEMINI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Grok => "Grok",
            Provider::Openai => "OpenAI",
            Provider::Gemini => "Gemini",
        }
    }

    /// Parse a provider name as given in configuration. Unknown names fall
    /// back to the default provider.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "grok" | "xai" => Provider::Grok,
            "openai" => Provider::Openai,
            "gemini" | "google" => Provider::Gemini,
            _ => Provider::default(),
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String> {
        let config = self.config();
        std::env::var(config.env_var).map_err(|_| KonspektError::MissingApiKey {
            env_var: config.env_var.to_string(),
        })
    }

    /// Whether the API key is present, without exposing it.
    pub fn api_key_configured(&self) -> bool {
        std::env::var(self.config().env_var).is_ok_and(|v| !v.trim().is_empty())
    }
}
