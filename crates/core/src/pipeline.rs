use std::{sync::Arc, time::Instant};

use chrono::Utc;
use tracing::{debug, info};

use crate::{
    ai::Generate,
    cache::{ResultCache, content_fingerprint, video_fingerprint},
    error::{KonspektError, Result},
    transcript::{FetchTranscript, clean_transcript, extract_video_id, validate_pasted_transcript},
    types::{EnvelopeMeta, ProcessOutcome, ResultEnvelope},
};

/// Coordinates cache lookup, transcript acquisition, generation, and cache
/// population. Holds no state of its own; a cache read never triggers
/// generation, and each successful generation writes the cache once.
///
/// Two concurrent requests for the same uncached fingerprint may both
/// generate; the second write simply overwrites the first.
pub struct Processor {
    cache: Arc<ResultCache>,
    generator: Arc<dyn Generate>,
    fetcher: Arc<dyn FetchTranscript>,
}

impl Processor {
    pub fn new(
        cache: Arc<ResultCache>,
        generator: Arc<dyn Generate>,
        fetcher: Arc<dyn FetchTranscript>,
    ) -> Self {
        Self {
            cache,
            generator,
            fetcher,
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// URL path: resolve the video id, serve from cache or fetch captions
    /// and generate.
    pub async fn process_video(&self, video_url: &str) -> Result<ProcessOutcome> {
        let video_id = extract_video_id(video_url).ok_or_else(|| {
            KonspektError::validation(format!("not a recognizable YouTube URL: {video_url}"))
        })?;
        let key = video_fingerprint(&video_id);

        if let Some(envelope) = self.cache.get(&key) {
            debug!(%key, "cache hit");
            return Ok(ProcessOutcome {
                envelope,
                cached: true,
            });
        }

        let started = Instant::now();
        let transcript = self.fetcher.fetch(&video_id).await?;
        if transcript.is_empty() {
            return Err(KonspektError::TranscriptNotFound {
                video_id: video_id.clone(),
                reason: "caption track was empty".to_string(),
            });
        }

        let bundle = self.generator.process_transcript(&transcript, &video_id).await?;
        let envelope = ResultEnvelope {
            video_id: Some(video_id.clone()),
            video_url: Some(format!("https://www.youtube.com/watch?v={video_id}")),
            bundle,
            meta: EnvelopeMeta {
                transcript_chars: transcript.chars().count(),
                processing_ms: started.elapsed().as_millis() as u64,
                generated_at: Utc::now(),
            },
        };
        self.cache.set(&key, envelope.clone());
        info!(video_id, ms = envelope.meta.processing_ms, "generated bundle for video");

        Ok(ProcessOutcome {
            envelope,
            cached: false,
        })
    }

    /// Pasted-transcript path: same flow keyed by a content hash of the
    /// raw text, with no acquisition step.
    pub async fn process_pasted(&self, transcript: &str) -> Result<ProcessOutcome> {
        validate_pasted_transcript(transcript)?;
        let key = content_fingerprint(transcript);

        if let Some(envelope) = self.cache.get(&key) {
            debug!(%key, "cache hit");
            return Ok(ProcessOutcome {
                envelope,
                cached: true,
            });
        }

        let started = Instant::now();
        let cleaned = clean_transcript(transcript);
        let bundle = self
            .generator
            .process_transcript(&cleaned, "pasted transcript")
            .await?;
        let envelope = ResultEnvelope {
            video_id: None,
            video_url: None,
            bundle,
            meta: EnvelopeMeta {
                transcript_chars: transcript.chars().count(),
                processing_ms: started.elapsed().as_millis() as u64,
                generated_at: Utc::now(),
            },
        };
        self.cache.set(&key, envelope.clone());
        info!(%key, ms = envelope.meta.processing_ms, "generated bundle for pasted transcript");

        Ok(ProcessOutcome {
            envelope,
            cached: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;

    use crate::types::LearningBundle;

    struct StubGenerator {
        calls: AtomicUsize,
    }

    impl StubGenerator {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Generate for StubGenerator {
        async fn process_transcript(&self, _text: &str, source: &str) -> Result<LearningBundle> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(LearningBundle {
                title: format!("Bundle for {source}"),
                summary: "A summary.".to_string(),
                key_points: vec!["one".to_string(), "two".to_string()],
                quiz: vec![],
            })
        }
    }

    struct StubFetcher {
        transcript: Result<String>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn returning(transcript: &str) -> Arc<Self> {
            Arc::new(Self {
                transcript: Ok(transcript.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(err: KonspektError) -> Arc<Self> {
            Arc::new(Self {
                transcript: Err(err),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl FetchTranscript for StubFetcher {
        async fn fetch(&self, video_id: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.transcript {
                Ok(text) => Ok(text.clone()),
                Err(KonspektError::CaptionsDisabled { .. }) => {
                    Err(KonspektError::CaptionsDisabled {
                        video_id: video_id.to_string(),
                    })
                }
                Err(_) => Err(KonspektError::TranscriptFetchFailed {
                    video_id: video_id.to_string(),
                    reason: "stubbed failure".to_string(),
                }),
            }
        }
    }

    fn processor(
        generator: Arc<StubGenerator>,
        fetcher: Arc<StubFetcher>,
    ) -> (Processor, Arc<ResultCache>) {
        let cache = Arc::new(ResultCache::new(Duration::from_secs(60)));
        let p = Processor::new(cache.clone(), generator, fetcher);
        (p, cache)
    }

    #[tokio::test]
    async fn miss_generates_and_populates_cache() {
        let generator = StubGenerator::new();
        let fetcher = StubFetcher::returning("a transcript about things");
        let (p, cache) = processor(generator.clone(), fetcher);

        let out = p
            .process_video("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .await
            .unwrap();
        assert!(!out.cached);
        assert_eq!(out.envelope.video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            out.envelope.video_url.as_deref(),
            Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        );
        assert_eq!(generator.calls(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn hit_skips_generation_entirely() {
        let generator = StubGenerator::new();
        let fetcher = StubFetcher::returning("a transcript about things");
        let (p, _cache) = processor(generator.clone(), fetcher.clone());

        let first = p.process_video("dQw4w9WgXcQ").await.unwrap();
        assert!(!first.cached);

        let second = p
            .process_video("https://youtu.be/dQw4w9WgXcQ")
            .await
            .unwrap();
        assert!(second.cached);
        assert_eq!(second.envelope, first.envelope);
        // neither the provider nor the caption endpoint is touched again
        assert_eq!(generator.calls(), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unrelated_url_is_a_validation_error() {
        let generator = StubGenerator::new();
        let fetcher = StubFetcher::returning("whatever");
        let (p, _) = processor(generator.clone(), fetcher);

        let err = p.process_video("https://vimeo.com/12345").await.unwrap_err();
        assert!(matches!(err, KonspektError::Validation { .. }));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn fetch_failures_pass_through_without_generation() {
        let generator = StubGenerator::new();
        let fetcher = StubFetcher::failing(KonspektError::CaptionsDisabled {
            video_id: String::new(),
        });
        let (p, cache) = processor(generator.clone(), fetcher);

        let err = p.process_video("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, KonspektError::CaptionsDisabled { .. }));
        assert_eq!(generator.calls(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn pasted_path_validates_bounds() {
        let generator = StubGenerator::new();
        let fetcher = StubFetcher::returning("unused");
        let (p, _) = processor(generator.clone(), fetcher);

        let err = p.process_pasted(&"x".repeat(99)).await.unwrap_err();
        assert!(matches!(err, KonspektError::Validation { .. }));
        let err = p.process_pasted(&"x".repeat(50_001)).await.unwrap_err();
        assert!(matches!(err, KonspektError::Validation { .. }));
        assert_eq!(generator.calls(), 0);

        let out = p.process_pasted(&"x".repeat(100)).await.unwrap();
        assert!(!out.cached);
        assert!(out.envelope.video_id.is_none());
        assert_eq!(out.envelope.meta.transcript_chars, 100);
    }

    #[tokio::test]
    async fn identical_pasted_text_hits_the_cache() {
        let generator = StubGenerator::new();
        let fetcher = StubFetcher::returning("unused");
        let (p, _) = processor(generator.clone(), fetcher);

        let text = "word ".repeat(50);
        let first = p.process_pasted(&text).await.unwrap();
        let second = p.process_pasted(&text).await.unwrap();
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(generator.calls(), 1);
    }
}
