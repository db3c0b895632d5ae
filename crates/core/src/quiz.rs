use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::{
    error::{KonspektError, Result},
    types::{OPTION_COUNT, QUIZ_LEN, QuizQuestion},
};

static FENCED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fenced block pattern")
});

const CORRECT_LABELS: [&str; 4] = ["A", "B", "C", "D"];

/// Parses the model's quiz output into raw question values.
///
/// Strategies are tried in order, short-circuiting on the first success:
/// direct JSON parse, fenced code block, first bracket-matched top-level
/// array or object substring. Errors only when all three fail.
pub fn parse_quiz_payload(raw: &str) -> Result<Vec<Value>> {
    let raw = raw.trim();

    let parsed = serde_json::from_str::<Value>(raw)
        .ok()
        .or_else(|| extract_fenced_block(raw))
        .or_else(|| extract_balanced_json(raw))
        .ok_or_else(|| KonspektError::MalformedOutput {
            reason: "no JSON quiz found in model output".to_string(),
        })?;

    Ok(question_values(parsed))
}

/// Strategy 2: JSON inside a fenced code block.
fn extract_fenced_block(raw: &str) -> Option<Value> {
    let inner = FENCED_RE.captures(raw)?.get(1)?.as_str().trim().to_string();
    serde_json::from_str(&inner).ok()
}

/// Strategy 3: first top-level `[...]` or `{...}` substring, found by
/// bracket matching that honors JSON string literals and escapes.
fn extract_balanced_json(raw: &str) -> Option<Value> {
    let start = raw.find(['[', '{'])?;
    let chars: Vec<char> = raw[start..].chars().collect();
    let open = chars[0];
    let close = if open == '[' { ']' } else { '}' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut end = None;
    for (i, &ch) in chars.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if !in_string && c == open => depth += 1,
            c if !in_string && c == close => {
                depth -= 1;
                if depth == 0 {
                    end = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end?;
    let candidate: String = chars[..=end].iter().collect();
    serde_json::from_str(&candidate).ok()
}

fn question_values(parsed: Value) -> Vec<Value> {
    match parsed {
        Value::Array(items) => items,
        Value::Object(ref obj) => match obj.get("questions").or_else(|| obj.get("quiz")) {
            Some(Value::Array(items)) => items.clone(),
            _ => vec![parsed],
        },
        _ => Vec::new(),
    }
}

/// Normalizes raw question values into exactly [`QUIZ_LEN`] questions,
/// each with exactly [`OPTION_COUNT`] options and a correct label in
/// {A, B, C, D}. Malformed fields are replaced with placeholders;
/// missing trailing questions are synthesized, never fabricated.
pub fn normalize_quiz(items: Vec<Value>) -> Vec<QuizQuestion> {
    let mut quiz: Vec<QuizQuestion> = items
        .iter()
        .take(QUIZ_LEN)
        .enumerate()
        .map(|(idx, value)| normalize_question(idx, value))
        .collect();
    while quiz.len() < QUIZ_LEN {
        quiz.push(placeholder_question(quiz.len() + 1));
    }
    quiz
}

fn normalize_question(idx: usize, value: &Value) -> QuizQuestion {
    let number = (idx + 1) as u32;

    let question = value["question"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Question {number}"));

    let options = value["options"]
        .as_array()
        .filter(|opts| opts.len() == OPTION_COUNT)
        .map(|opts| opts.iter().map(option_text).collect::<Vec<_>>())
        .filter(|opts: &Vec<String>| opts.iter().all(|o| !o.is_empty()))
        .unwrap_or_else(placeholder_options);

    let correct = value["correct"]
        .as_str()
        .or_else(|| value["correctAnswer"].as_str())
        .or_else(|| value["answer"].as_str())
        .and_then(normalize_label)
        .unwrap_or_else(|| "A".to_string());

    let explanation = value["explanation"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "No explanation available.".to_string());

    QuizQuestion {
        number,
        question,
        options,
        correct,
        explanation,
    }
}

fn option_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn normalize_label(raw: &str) -> Option<String> {
    let label = raw.trim().chars().next()?.to_ascii_uppercase().to_string();
    CORRECT_LABELS.contains(&label.as_str()).then_some(label)
}

fn placeholder_options() -> Vec<String> {
    (0..OPTION_COUNT).map(|i| format!("Option {}", CORRECT_LABELS[i])).collect()
}

fn placeholder_question(number: usize) -> QuizQuestion {
    QuizQuestion {
        number: number as u32,
        question: format!("Question {number} could not be generated"),
        options: placeholder_options(),
        correct: "A".to_string(),
        explanation: "No explanation available.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn well_formed(n: usize) -> Value {
        json!({
            "question": format!("What is {n}?"),
            "options": ["one", "two", "three", "four"],
            "correct": "B",
            "explanation": "Because."
        })
    }

    #[test]
    fn direct_parse_succeeds() {
        let raw = json!([well_formed(1), well_formed(2)]).to_string();
        assert_eq!(parse_quiz_payload(&raw).unwrap().len(), 2);
    }

    #[test]
    fn fenced_block_parse_succeeds() {
        let raw = format!(
            "Here is your quiz:\n```json\n{}\n```\nEnjoy!",
            json!([well_formed(1)])
        );
        assert_eq!(parse_quiz_payload(&raw).unwrap().len(), 1);
    }

    #[test]
    fn bracket_matching_finds_embedded_array() {
        let raw = format!(
            "Sure! The questions are {} — let me know if you need more.",
            json!([well_formed(1), well_formed(2), well_formed(3)])
        );
        assert_eq!(parse_quiz_payload(&raw).unwrap().len(), 3);
    }

    #[test]
    fn bracket_matching_honors_strings_with_brackets() {
        let raw = r#"noise [{"question": "What does [x] mean?", "options": ["a","b","c","d"], "correct": "A", "explanation": "e"}] trailing"#;
        let items = parse_quiz_payload(raw).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["question"], "What does [x] mean?");
    }

    #[test]
    fn object_with_questions_field_unwraps() {
        let raw = json!({"questions": [well_formed(1), well_formed(2)]}).to_string();
        assert_eq!(parse_quiz_payload(&raw).unwrap().len(), 2);
    }

    #[test]
    fn garbage_fails() {
        assert!(parse_quiz_payload("I cannot generate a quiz right now.").is_err());
    }

    #[test]
    fn normalization_always_yields_ten_by_four() {
        let cases: Vec<Vec<Value>> = vec![
            vec![],                                          // empty
            (0..3).map(|i| well_formed(i)).collect(),        // too few
            (0..15).map(|i| well_formed(i)).collect(),       // too many
            vec![json!({"question": 7, "options": ["only", "two"], "correct": "Z"})],
            vec![json!({"options": "not an array"})],
            vec![json!("just a string")],
        ];
        for items in cases {
            let quiz = normalize_quiz(items);
            assert_eq!(quiz.len(), QUIZ_LEN);
            for (i, q) in quiz.iter().enumerate() {
                assert_eq!(q.number as usize, i + 1);
                assert_eq!(q.options.len(), OPTION_COUNT);
                assert!(CORRECT_LABELS.contains(&q.correct.as_str()));
                assert!(!q.question.is_empty());
                assert!(!q.explanation.is_empty());
            }
        }
    }

    #[test]
    fn well_formed_fields_survive_normalization() {
        let quiz = normalize_quiz(vec![well_formed(1)]);
        assert_eq!(quiz[0].question, "What is 1?");
        assert_eq!(quiz[0].options, vec!["one", "two", "three", "four"]);
        assert_eq!(quiz[0].correct, "B");
        assert_eq!(quiz[0].explanation, "Because.");
    }

    #[test]
    fn alternate_answer_keys_are_accepted() {
        let quiz = normalize_quiz(vec![json!({
            "question": "Q", "options": ["a","b","c","d"],
            "correctAnswer": "c", "explanation": "E"
        })]);
        assert_eq!(quiz[0].correct, "C");
    }

    #[test]
    fn padded_questions_are_marked_synthetic() {
        let quiz = normalize_quiz(vec![well_formed(1)]);
        assert!(quiz[9].question.contains("could not be generated"));
        assert_eq!(quiz[9].correct, "A");
    }
}
