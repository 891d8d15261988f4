use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, info};

use crate::errors::QuizError;
use crate::models::{Quiz, QuizQuestion};

// Import logging macros
use crate::log_validation;

/// Opening fence token: three backticks and an optional language tag (`json`, `JSON`, ...)
static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z0-9_+.-]*").expect("fence pattern is valid"));

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

#[derive(Debug, Deserialize)]
struct RawQuiz {
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    correct_answer: i64,
    #[serde(default)]
    explanation: Option<String>,
}

/// Strip one leading fence line and one trailing fence from a model response.
///
/// Only the outermost fence pair is touched, so backticks inside question text survive.
pub fn extract_quiz_json(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(found) = OPENING_FENCE.find(trimmed) else {
        return trimmed;
    };

    let body = trimmed[found.end()..].trim();
    body.strip_suffix("```").map(str::trim).unwrap_or(body)
}

/// Parse generated text into a validated [`Quiz`], assigning fresh question ids.
pub fn parse_quiz(content: &str) -> Result<Quiz, QuizError> {
    parse_quiz_with_stamp(content, next_generation_stamp())
}

/// Parse with an explicit generation stamp; ids become `q_<stamp>_<index>`.
pub fn parse_quiz_with_stamp(content: &str, stamp: i64) -> Result<Quiz, QuizError> {
    let json_content = extract_quiz_json(content);
    debug!(
        original_length = content.len(),
        extracted_length = json_content.len(),
        "Extracted quiz JSON from response"
    );

    let raw: RawQuiz = serde_json::from_str(json_content).map_err(|e| {
        let err = QuizError::from(e);
        log_validation!(failure, "quiz_parser", error = err);
        err
    })?;

    let questions = raw
        .questions
        .into_iter()
        .enumerate()
        .map(|(index, raw)| finalize_question(index, raw, stamp))
        .collect::<Result<Vec<_>, _>>();

    let quiz = questions
        .and_then(|questions| {
            let quiz = Quiz { questions };
            quiz.validate().map(|_| quiz)
        })
        .inspect_err(|err| {
            log_validation!(failure, "quiz_parser", error = err);
        })?;

    info!(question_count = quiz.len(), stamp, "Parsed generated quiz");
    Ok(quiz)
}

// Negative answer indexes cannot be represented once converted, so they are rejected here;
// everything else is checked by `Quiz::validate`.
fn finalize_question(index: usize, raw: RawQuestion, stamp: i64) -> Result<QuizQuestion, QuizError> {
    let correct_answer = usize::try_from(raw.correct_answer).map_err(|_| QuizError::QuizValidation {
        index,
        reason: format!("correctAnswer {} is negative", raw.correct_answer),
    })?;

    Ok(QuizQuestion {
        id: format!("q_{}_{}", stamp, index),
        question: raw.question,
        options: raw.options,
        correct_answer,
        explanation: raw.explanation.filter(|e| !e.trim().is_empty()),
    })
}

/// Millisecond timestamp that never repeats within this process.
pub fn next_generation_stamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ParseFailureKind;
    use std::collections::HashSet;

    const SINGLE: &str = r#"{"questions":[{"question":"Q","options":["A","B","C","D"],"correctAnswer":2}]}"#;

    fn two_questions() -> String {
        r#"{
            "questions": [
                {"question": "Capital of France?", "options": ["Paris", "Rome", "Oslo", "Bern"], "correctAnswer": 0, "explanation": "Paris is the capital."},
                {"question": "2 + 2?", "options": ["3", "4", "5", "22"], "correctAnswer": 1}
            ]
        }"#
        .to_string()
    }

    fn without_ids(quiz: &Quiz) -> Vec<(String, Vec<String>, usize, Option<String>)> {
        quiz.questions
            .iter()
            .map(|q| (q.question.clone(), q.options.clone(), q.correct_answer, q.explanation.clone()))
            .collect()
    }

    #[test]
    fn test_single_question_scenario() {
        let quiz = parse_quiz(SINGLE).unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz.questions[0].correct_answer, 2);
        assert!(!quiz.questions[0].id.is_empty());
        assert!(quiz.questions[0].explanation.is_none());
    }

    #[test]
    fn test_not_json_is_parse_error() {
        let err = parse_quiz("not json").unwrap_err();
        assert!(matches!(err, QuizError::QuizParse { kind: ParseFailureKind::Syntax, .. }));
    }

    #[test]
    fn test_missing_questions_key_is_shape_error() {
        let err = parse_quiz(r#"{"items": []}"#).unwrap_err();
        match err {
            QuizError::QuizParse { kind, message } => {
                assert_eq!(kind, ParseFailureKind::Shape);
                assert!(message.contains("questions"));
            }
            other => panic!("expected QuizParse, got {:?}", other),
        }
    }

    #[test]
    fn test_fence_wrapping_is_transparent() {
        let bare = parse_quiz(&two_questions()).unwrap();
        let tagged = parse_quiz(&format!("```json\n{}\n```", two_questions())).unwrap();
        let untagged = parse_quiz(&format!("  ```\n{}\n```  \n", two_questions())).unwrap();

        assert_eq!(without_ids(&bare), without_ids(&tagged));
        assert_eq!(without_ids(&bare), without_ids(&untagged));
    }

    #[test]
    fn test_inner_backticks_survive() {
        let text = "```json\n{\"questions\":[{\"question\":\"What does ```rust mark?\",\"options\":[\"a\",\"b\",\"c\",\"d\"],\"correctAnswer\":0}]}\n```";
        let quiz = parse_quiz(text).unwrap();
        assert_eq!(quiz.questions[0].question, "What does ```rust mark?");
    }

    #[test]
    fn test_extract_leaves_bare_json_alone() {
        assert_eq!(extract_quiz_json("  {\"a\": 1}\n"), "{\"a\": 1}");
        assert_eq!(extract_quiz_json("```JSON {\"a\": 1}```"), "{\"a\": 1}");
    }

    #[test]
    fn test_ids_follow_stamp_and_position() {
        let quiz = parse_quiz_with_stamp(&two_questions(), 1700000000000).unwrap();
        assert_eq!(quiz.questions[0].id, "q_1700000000000_0");
        assert_eq!(quiz.questions[1].id, "q_1700000000000_1");
    }

    #[test]
    fn test_ids_unique_across_calls() {
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let quiz = parse_quiz(&two_questions()).unwrap();
            for question in quiz.questions {
                assert!(seen.insert(question.id.clone()), "duplicate id {}", question.id);
            }
        }
    }

    #[test]
    fn test_order_is_preserved() {
        let quiz = parse_quiz(&two_questions()).unwrap();
        assert_eq!(quiz.questions[0].question, "Capital of France?");
        assert_eq!(quiz.questions[1].question, "2 + 2?");
    }

    #[test]
    fn test_validation_failures() {
        let cases = vec![
            (r#"{"questions":[{"question":"Q","options":["A","B","C"],"correctAnswer":0}]}"#, 0),
            (r#"{"questions":[{"question":"Q","options":["A","B","C","D"],"correctAnswer":4}]}"#, 0),
            (r#"{"questions":[{"question":"Q","options":["A","B","C","D"],"correctAnswer":-1}]}"#, 0),
            (r#"{"questions":[{"question":"  ","options":["A","B","C","D"],"correctAnswer":0}]}"#, 0),
            (
                r#"{"questions":[{"question":"Q","options":["A","B","C","D"],"correctAnswer":0},{"question":"R","options":["A","","C","D"],"correctAnswer":0}]}"#,
                1,
            ),
            (r#"{"questions":[]}"#, 0),
        ];

        for (text, expected_index) in cases {
            match parse_quiz(text) {
                Err(QuizError::QuizValidation { index, .. }) => assert_eq!(index, expected_index, "{}", text),
                other => panic!("expected QuizValidation for {}, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_stamps_strictly_increase() {
        let first = next_generation_stamp();
        let second = next_generation_stamp();
        assert!(second > first);
    }
}
