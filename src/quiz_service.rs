use tracing::{debug, error, info};

use crate::errors::QuizError;
use crate::generation_client::GenerationClient;
use crate::models::Quiz;
use crate::quiz_parser::parse_quiz;

/// Notes shorter than this (after trimming) are not worth quizzing on
pub const MIN_NOTE_CHARS: usize = 50;

pub const MAX_QUESTION_COUNT: usize = 20;

/// Builds the instruction sent to the completion service for a set of notes.
pub fn build_quiz_prompt(notes: &str, question_count: usize) -> String {
    format!(
        r#"You are a memory companion AI helping users learn through spaced repetition. Generate {count} multiple-choice quiz questions from the following text. Each question should test understanding and memory retention.

Text to analyze:
"""
{notes}
"""

Generate exactly {count} questions in the following JSON format:
{{
  "questions": [
    {{
      "question": "The question text",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correctAnswer": 0,
      "explanation": "Brief explanation of why this is correct"
    }}
  ]
}}

Important:
- Make questions clear and concise (suitable for quick review)
- correctAnswer should be the index (0-3) of the correct option
- Include 4 options per question
- Questions should focus on key concepts that are worth remembering long-term
- Return ONLY valid JSON, no additional text or markdown"#,
        count = question_count,
        notes = notes
    )
}

/// Checks notes are long enough to generate from; returns the trimmed notes.
pub fn validate_notes(notes: &str) -> Result<&str, QuizError> {
    let trimmed = notes.trim();
    let actual = trimmed.chars().count();
    if actual < MIN_NOTE_CHARS {
        return Err(QuizError::NotesTooShort {
            minimum: MIN_NOTE_CHARS,
            actual,
        });
    }
    Ok(trimmed)
}

/// Notes → prompt → completion → parsed quiz
#[derive(Clone)]
pub struct QuizService {
    client: GenerationClient,
    default_question_count: usize,
}

impl QuizService {
    pub fn new(client: GenerationClient) -> Self {
        let default_question_count = client.config().question_count;
        Self {
            client,
            default_question_count,
        }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    pub fn default_question_count(&self) -> usize {
        self.default_question_count
    }

    pub async fn generate_quiz_from_notes(
        &self,
        notes: &str,
        question_count: Option<usize>,
    ) -> Result<Quiz, QuizError> {
        let notes = validate_notes(notes)?;
        let question_count = question_count.unwrap_or(self.default_question_count);
        if question_count == 0 || question_count > MAX_QUESTION_COUNT {
            return Err(QuizError::InvalidQuestionCount {
                requested: question_count,
                maximum: MAX_QUESTION_COUNT,
            });
        }

        info!(
            notes_length = notes.len(),
            question_count,
            model = %self.client.model_name(),
            "Generating quiz from notes"
        );

        let prompt = build_quiz_prompt(notes, question_count);
        let response_text = self.client.generate(&prompt).await?;

        debug!(response_content = %response_text, "Raw completion for quiz generation");

        match parse_quiz(&response_text) {
            Ok(quiz) => {
                info!(question_count = quiz.len(), "Successfully generated quiz");
                Ok(quiz)
            }
            Err(e) => {
                error!(error = %e, "Failed to turn completion into a quiz");
                Err(e)
            }
        }
    }
}
