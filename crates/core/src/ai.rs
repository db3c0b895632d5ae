use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::{
    config::Settings,
    error::{KonspektError, Result},
    provider::Provider,
    quiz::{normalize_quiz, parse_quiz_payload},
    types::{LearningBundle, QuizQuestion},
};

/// Marker inserted where the middle of an over-budget transcript was cut.
pub const ELISION_MARKER: &str = "[... middle of transcript omitted ...]";

/// Title generation only looks at the opening of the transcript.
const TITLE_HEAD_CHARS: usize = 500;

static SUMMARY_PROMPT: &str = r#"You are an educational content summarizer.

Write a summary of the transcript the user provides:
- 2 to 3 paragraphs of plain prose
- cover the main argument, the supporting points, and the conclusion
- no headings, no bullet lists, no preamble

Output ONLY the summary text, nothing else."#;

static KEY_POINTS_PROMPT: &str = r#"You are an educational content analyzer.

Extract the key points from the transcript the user provides:
- between 6 and 10 points
- one point per line, each line starting with "- "
- each point is a single self-contained sentence

Output ONLY the bulleted list, nothing else."#;

static QUIZ_PROMPT: &str = r#"You are a quiz generator for educational content.

Create a 10-question multiple-choice quiz from the transcript the user provides.

You MUST output ONLY a valid JSON array matching this exact structure (no markdown, no explanation):
[
  {
    "question": "The question text",
    "options": ["First option", "Second option", "Third option", "Fourth option"],
    "correct": "A",
    "explanation": "Why this answer is correct"
  }
]

Rules:
- Exactly 10 questions covering the whole transcript
- Exactly 4 options per question
- "correct" is the letter of the right option: "A", "B", "C" or "D"
- Questions test understanding, not trivia about phrasing
- Output ONLY the JSON, nothing else"#;

static TITLE_PROMPT: &str = r#"You are given the opening of a transcript.

Write one concise, descriptive title for the content (at most 12 words).
Output ONLY the title text, nothing else."#;

static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•]|\d{1,2}[.)])\s*(.+)$").expect("bullet pattern")
});

/// Extracts bulleted lines from a model response: strips the marker,
/// drops blanks, caps at 10. A short list is tolerated, not an error.
pub fn parse_key_points(raw: &str) -> Vec<String> {
    raw.lines()
        .filter_map(|line| BULLET_RE.captures(line).map(|cap| cap[1].trim().to_string()))
        .filter(|point| !point.is_empty())
        .take(10)
        .collect()
}

/// Seam for the orchestrator: anything that can turn transcript text into
/// a learning bundle.
#[async_trait]
pub trait Generate: Send + Sync {
    async fn process_transcript(&self, text: &str, source: &str) -> Result<LearningBundle>;
}

/// Client for an OpenAI-compatible chat completion endpoint.
pub struct GenAiClient {
    http: reqwest::Client,
    provider: Provider,
    api_url: String,
    api_key_override: Option<String>,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
    char_budget: usize,
}

impl GenAiClient {
    pub fn new(settings: &Settings) -> Self {
        let config = settings.provider.config();
        Self {
            http: reqwest::Client::new(),
            provider: settings.provider.clone(),
            api_url: config.api_url.to_string(),
            api_key_override: None,
            model: settings.resolved_model(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
            char_budget: settings.transcript_char_budget,
        }
    }

    /// Points the client at an arbitrary endpoint with an explicit key.
    /// Used by tests; also covers self-hosted OpenAI-compatible gateways.
    pub fn with_endpoint(
        mut self,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        self.api_url = api_url.into();
        self.api_key_override = Some(api_key.into());
        self
    }

    fn api_key(&self) -> Result<String> {
        match &self.api_key_override {
            Some(key) => Ok(key.clone()),
            None => self.provider.validate_api_key(),
        }
    }

    /// Keeps an equal prefix and suffix of an over-budget transcript,
    /// marking the elision explicitly so the model sees both the
    /// introduction and the conclusion.
    fn prepare_input(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= self.char_budget {
            return text.to_string();
        }
        let half = self.char_budget / 2;
        let prefix: String = chars[..half].iter().collect();
        let suffix: String = chars[chars.len() - half..].iter().collect();
        format!("{prefix}\n\n{ELISION_MARKER}\n\n{suffix}")
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let api_key = self.api_key()?;

        let response = self
            .http
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "system",
                        "content": system_prompt,
                    },
                    {
                        "role": "user",
                        "content": user_prompt,
                    },
                ],
                "temperature": self.temperature,
                "max_tokens": self.max_output_tokens,
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    KonspektError::ProviderUnavailable {
                        reason: e.to_string(),
                    }
                } else {
                    KonspektError::ApiError(e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(KonspektError::ProviderQuota {
                reason: format!("provider returned HTTP {status}"),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("insufficient_quota") || body.contains("quota") {
                return Err(KonspektError::ProviderQuota {
                    reason: format!("provider returned HTTP {status}: {body}"),
                });
            }
            return Err(KonspektError::ProviderUnavailable {
                reason: format!("provider returned HTTP {status}: {body}"),
            });
        }

        let body = response.json::<Value>().await?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| KonspektError::MalformedOutput {
                reason: format!("unexpected response shape: {body}"),
            })?;

        Ok(content.trim().to_string())
    }

    async fn generate_summary(&self, input: &str) -> Result<String> {
        let summary = self.complete(SUMMARY_PROMPT, input).await?;
        if summary.is_empty() {
            return Err(KonspektError::MalformedOutput {
                reason: "model returned an empty summary".to_string(),
            });
        }
        Ok(summary)
    }

    async fn generate_key_points(&self, input: &str) -> Result<Vec<String>> {
        let raw = self.complete(KEY_POINTS_PROMPT, input).await?;
        Ok(parse_key_points(&raw))
    }

    async fn generate_quiz(&self, input: &str) -> Result<Vec<QuizQuestion>> {
        let raw = self.complete(QUIZ_PROMPT, input).await?;
        let items = parse_quiz_payload(&raw)?;
        Ok(normalize_quiz(items))
    }

    async fn generate_title(&self, input: &str) -> Result<String> {
        let head: String = input.chars().take(TITLE_HEAD_CHARS).collect();
        let title = self.complete(TITLE_PROMPT, &head).await?;
        let title = title.trim_matches('"').trim().to_string();
        if title.is_empty() {
            return Ok("Untitled transcript".to_string());
        }
        Ok(title)
    }
}

#[async_trait]
impl Generate for GenAiClient {
    /// Fans out the three main generations concurrently and joins them;
    /// the first failure propagates and the remaining requests are
    /// dropped. The title runs after, over the opening only.
    async fn process_transcript(&self, text: &str, source: &str) -> Result<LearningBundle> {
        let input = self.prepare_input(text);
        debug!(source, chars = text.chars().count(), "generating learning bundle");

        let (summary, key_points, quiz) = tokio::try_join!(
            self.generate_summary(&input),
            self.generate_key_points(&input),
            self.generate_quiz(&input),
        )?;
        let title = self.generate_title(&input).await?;

        Ok(LearningBundle {
            title,
            summary,
            key_points,
            quiz,
        })
    }
}
