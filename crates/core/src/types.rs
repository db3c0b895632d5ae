use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of questions every generated quiz is normalized to.
pub const QUIZ_LEN: usize = 10;

/// Number of answer options every quiz question carries.
pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// 1-based position in the quiz.
    pub number: u32,
    pub question: String,
    /// Always exactly [`OPTION_COUNT`] entries after normalization.
    pub options: Vec<String>,
    /// One of "A", "B", "C", "D".
    pub correct: String,
    pub explanation: String,
}

/// The AI-derived artifact for one transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningBundle {
    pub title: String,
    pub summary: String,
    pub key_points: Vec<String>,
    /// Always exactly [`QUIZ_LEN`] entries after normalization.
    pub quiz: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeMeta {
    pub transcript_chars: usize,
    pub processing_ms: u64,
    pub generated_at: DateTime<Utc>,
}

/// What the service returns (and caches) for one piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(flatten)]
    pub bundle: LearningBundle,
    pub meta: EnvelopeMeta,
}

/// Pipeline result: the envelope plus whether it was served from cache.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub envelope: ResultEnvelope,
    pub cached: bool,
}
