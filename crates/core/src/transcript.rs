use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::error::{KonspektError, Result};

/// Caller-facing bounds for pasted transcripts, in characters.
pub const MIN_TRANSCRIPT_CHARS: usize = 100;
pub const MAX_TRANSCRIPT_CHARS: usize = 50_000;

static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtu\.be/|[?&]v=|/embed/|/shorts/|/live/)([A-Za-z0-9_-]{11})([^A-Za-z0-9_-]|$)")
        .expect("video id pattern")
});

static BARE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("bare id pattern"));

static BRACKETED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("bracketed pattern"));

static PARENTHETICAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("parenthetical pattern"));

// Caption artifacts: music glyphs, zero-width/replacement characters, and
// ">>" speaker-change markers.
static ARTIFACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[♪♫\u{200b}\u{fffd}]|>>").expect("artifact pattern"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Extracts the 11-character video identifier from known YouTube URL
/// shapes, or accepts a bare identifier. Unrelated URLs yield `None`.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if BARE_ID_RE.is_match(input) {
        return Some(input.to_string());
    }
    if !input.contains("youtube.com") && !input.contains("youtu.be") {
        return None;
    }
    VIDEO_ID_RE
        .captures(input)
        .map(|cap| cap[1].to_string())
}

/// Normalizes caption text: strips `[bracketed]` and `(parenthetical)`
/// annotations and artifact glyphs, collapses whitespace runs, trims.
/// Idempotent: cleaning cleaned text yields the same text.
pub fn clean_transcript(raw: &str) -> String {
    let text = BRACKETED_RE.replace_all(raw, " ");
    let text = PARENTHETICAL_RE.replace_all(&text, " ");
    let text = ARTIFACT_RE.replace_all(&text, " ");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Validates a pasted transcript against the caller-facing length bounds.
pub fn validate_pasted_transcript(text: &str) -> Result<()> {
    let chars = text.chars().count();
    if chars < MIN_TRANSCRIPT_CHARS {
        return Err(KonspektError::validation(format!(
            "transcript too short: {chars} characters (minimum {MIN_TRANSCRIPT_CHARS})"
        )));
    }
    if chars > MAX_TRANSCRIPT_CHARS {
        return Err(KonspektError::validation(format!(
            "transcript too long: {chars} characters (maximum {MAX_TRANSCRIPT_CHARS})"
        )));
    }
    Ok(())
}

#[async_trait]
pub trait FetchTranscript: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<String>;
}

/// Fetches caption segments from YouTube's timedtext endpoint and
/// normalizes them into plain text.
pub struct TranscriptFetcher {
    http: reqwest::Client,
    base_url: String,
    language: String,
}

impl Default for TranscriptFetcher {
    fn default() -> Self {
        Self::new("https://www.youtube.com", "en")
    }
}

impl TranscriptFetcher {
    pub fn new(base_url: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            language: language.into(),
        }
    }

    fn caption_url(&self, video_id: &str) -> String {
        format!(
            "{}/api/timedtext?v={}&lang={}&fmt=json3",
            self.base_url, video_id, self.language
        )
    }
}

#[async_trait]
impl FetchTranscript for TranscriptFetcher {
    async fn fetch(&self, video_id: &str) -> Result<String> {
        let response = self
            .http
            .get(self.caption_url(video_id))
            .send()
            .await
            .map_err(|e| KonspektError::TranscriptFetchFailed {
                video_id: video_id.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(KonspektError::TranscriptNotFound {
                video_id: video_id.to_string(),
                reason: "no caption track for this video".to_string(),
            });
        }
        if !status.is_success() {
            return Err(KonspektError::TranscriptFetchFailed {
                video_id: video_id.to_string(),
                reason: format!("caption endpoint returned HTTP {status}"),
            });
        }

        // The endpoint answers 200 with an empty (or non-JSON) body when the
        // video has captions disabled.
        let body = response
            .text()
            .await
            .map_err(|e| KonspektError::TranscriptFetchFailed {
                video_id: video_id.to_string(),
                reason: e.to_string(),
            })?;
        if body.trim().is_empty() {
            return Err(KonspektError::CaptionsDisabled {
                video_id: video_id.to_string(),
            });
        }
        let payload: Value =
            serde_json::from_str(&body).map_err(|_| KonspektError::CaptionsDisabled {
                video_id: video_id.to_string(),
            })?;

        let text = payload["events"]
            .as_array()
            .map(|events| {
                events
                    .iter()
                    .filter_map(|event| {
                        event["segs"].as_array().map(|segs| {
                            segs.iter()
                                .filter_map(|seg| seg["utf8"].as_str())
                                .collect::<Vec<_>>()
                                .join("")
                        })
                    })
                    .filter(|s| !s.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        let cleaned = clean_transcript(&text);
        if cleaned.is_empty() {
            return Err(KonspektError::CaptionsDisabled {
                video_id: video_id.to_string(),
            });
        }
        debug!(video_id, chars = cleaned.chars().count(), "fetched transcript");
        Ok(cleaned)
    }
}
