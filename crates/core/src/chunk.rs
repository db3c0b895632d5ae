/// Splits text into segments of at most `max_chars` characters, preferring
/// sentence boundaries, then word boundaries. Not on the main pipeline
/// path; provided for callers that post-process long transcripts.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    assert!(max_chars > 0, "chunk size must be positive");

    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for sentence in split_sentences(text) {
        let sentence_len = sentence.chars().count();
        let current_len = current.chars().count();
        if current_len > 0 && current_len + sentence_len + 1 > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if sentence_len > max_chars {
            // no sentence boundary fits; fall back to word boundaries
            for word in sentence.split_whitespace() {
                let word_len = word.chars().count();
                let current_len = current.chars().count();
                if current_len > 0 && current_len + word_len + 1 > max_chars {
                    chunks.push(std::mem::take(&mut current));
                }
                if word_len > max_chars {
                    // pathological single token; hard split
                    let mut buf: Vec<char> = word.chars().collect();
                    while buf.len() > max_chars {
                        chunks.push(buf.drain(..max_chars).collect());
                    }
                    current = buf.into_iter().collect();
                } else {
                    if !current.is_empty() {
                        current.push(' ');
                    }
                    current.push_str(word);
                }
            }
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Splits on sentence-ending punctuation followed by whitespace, keeping
/// the punctuation with the sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev_was_terminal = false;
    for (idx, ch) in text.char_indices() {
        if prev_was_terminal && ch.is_whitespace() {
            let sentence = text[start..idx].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = idx;
        }
        prev_was_terminal = matches!(ch, '.' | '!' | '?');
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("Hello world.", 100), vec!["Hello world."]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("   ", 10).is_empty());
    }

    #[test]
    fn chunks_respect_the_bound() {
        let text = "One sentence here. Another sentence there. And a third one. Plus a fourth.";
        for chunk in chunk_text(text, 30) {
            assert!(chunk.chars().count() <= 30, "oversized chunk: {chunk:?}");
        }
    }

    #[test]
    fn splits_prefer_sentence_boundaries() {
        let text = "First sentence. Second sentence. Third sentence.";
        let chunks = chunk_text(text, 35);
        assert_eq!(chunks[0], "First sentence. Second sentence.");
        assert_eq!(chunks[1], "Third sentence.");
    }

    #[test]
    fn no_content_is_lost() {
        let text = "Alpha beta gamma. Delta epsilon zeta eta theta. Iota kappa.";
        let rejoined = chunk_text(text, 20).join(" ");
        let normalize = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(normalize(&rejoined), normalize(text));
    }

    #[test]
    fn oversized_single_word_is_hard_split() {
        let word = "x".repeat(25);
        let chunks = chunk_text(&word, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), word);
    }
}
