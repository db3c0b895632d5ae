use std::time::Duration;

use crate::provider::Provider;

/// Runtime settings, resolved from the environment once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    pub provider: Provider,
    /// Overrides the provider's default model when set.
    pub model: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Transcripts longer than this are truncated (prefix + suffix kept)
    /// before being sent to the model.
    pub transcript_char_budget: usize,
    pub cache_ttl: Duration,
    pub sweep_interval: Duration,
    pub production: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            temperature: 0.3,
            max_output_tokens: 2048,
            transcript_char_budget: 12_000,
            cache_ttl: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(600),
            production: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        Settings {
            provider: env("KONSPEKT_PROVIDER")
                .map(|s| Provider::parse(&s))
                .unwrap_or_default(),
            model: env("KONSPEKT_MODEL"),
            temperature: env_parse("KONSPEKT_TEMPERATURE", defaults.temperature),
            max_output_tokens: env_parse("KONSPEKT_MAX_OUTPUT_TOKENS", defaults.max_output_tokens),
            transcript_char_budget: env_parse(
                "KONSPEKT_TRANSCRIPT_CHAR_BUDGET",
                defaults.transcript_char_budget,
            ),
            cache_ttl: Duration::from_secs(env_parse("KONSPEKT_CACHE_TTL_SECS", 3600)),
            sweep_interval: Duration::from_secs(env_parse("KONSPEKT_SWEEP_INTERVAL_SECS", 600)),
            production: env("KONSPEKT_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production")),
        }
    }

    /// The model identifier actually used for generation requests.
    pub fn resolved_model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.config().default_model.to_string())
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env(key).and_then(|s| s.parse::<T>().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let s = Settings::default();
        assert_eq!(s.cache_ttl, Duration::from_secs(3600));
        assert!(s.sweep_interval < s.cache_ttl);
        assert_eq!(s.transcript_char_budget, 12_000);
        assert!(!s.production);
    }

    #[test]
    fn resolved_model_prefers_override() {
        let mut s = Settings::default();
        assert_eq!(s.resolved_model(), "gemini-3-flash");
        s.model = Some("gemini-3-pro".to_string());
        assert_eq!(s.resolved_model(), "gemini-3-pro");
    }
}
