use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::QuizError;

pub const OPTIONS_PER_QUESTION: usize = 4;

/// One generated assessment session, in practice order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, index: usize) -> Option<&QuizQuestion> {
        self.questions.get(index)
    }

    /// A quiz is playable when it has at least one question, every question is
    /// well formed and no two questions share an id.
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.questions.is_empty() {
            return Err(QuizError::QuizValidation {
                index: 0,
                reason: "quiz contains no questions".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for (index, question) in self.questions.iter().enumerate() {
            question.validate(index)?;
            if !seen.insert(question.id.as_str()) {
                return Err(QuizError::QuizValidation {
                    index,
                    reason: format!("duplicate question id '{}'", question.id),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String, // q_<stamp>_<index>, unique within the quiz
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_answer
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_answer).map(String::as_str)
    }

    /// Checks the question at position `index` of its quiz.
    pub fn validate(&self, index: usize) -> Result<(), QuizError> {
        let invalid = |reason: String| Err(QuizError::QuizValidation { index, reason });

        if self.id.trim().is_empty() {
            return invalid("question id is empty".to_string());
        }
        if self.question.trim().is_empty() {
            return invalid("question text is empty".to_string());
        }
        if self.options.len() != OPTIONS_PER_QUESTION {
            return invalid(format!(
                "expected {} options, found {}",
                OPTIONS_PER_QUESTION,
                self.options.len()
            ));
        }
        if let Some(blank) = self.options.iter().position(|o| o.trim().is_empty()) {
            return invalid(format!("option {} is blank", blank));
        }
        if self.correct_answer >= self.options.len() {
            return invalid(format!(
                "correctAnswer {} is outside 0..{}",
                self.correct_answer,
                self.options.len()
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_id: String,
    pub selected_answer: usize,
    pub correct_answer: usize,
    pub is_correct: bool,
}

impl UserAnswer {
    pub fn for_question(question: &QuizQuestion, selected: usize) -> Self {
        Self {
            question_id: question.id.clone(),
            selected_answer: selected,
            correct_answer: question.correct_answer,
            is_correct: question.is_correct(selected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResults {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    pub answers: Vec<UserAnswer>,
}

impl QuizResults {
    pub fn from_answers(total_questions: usize, answers: Vec<UserAnswer>) -> Self {
        let correct_answers = answers.iter().filter(|a| a.is_correct).count();
        Self {
            total_questions,
            correct_answers,
            incorrect_answers: total_questions.saturating_sub(correct_answers),
            answers,
        }
    }

    /// Rounded share of correct answers, 0-100.
    pub fn percentage(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        ((self.correct_answers as f64 / self.total_questions as f64) * 100.0).round() as u32
    }

    pub fn performance(&self) -> Performance {
        Performance::from_percentage(self.percentage())
    }
}

/// Score bands shown on the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    Perfect,
    Excellent,
    Good,
    NiceEffort,
    KeepPracticing,
}

impl Performance {
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= 100 {
            Performance::Perfect
        } else if percentage >= 80 {
            Performance::Excellent
        } else if percentage >= 60 {
            Performance::Good
        } else if percentage >= 40 {
            Performance::NiceEffort
        } else {
            Performance::KeepPracticing
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Performance::Perfect => "Perfect score! You're a memory master!",
            Performance::Excellent => "Excellent work! Your memory is getting stronger!",
            Performance::Good => "Good job! Keep practicing and you'll master this!",
            Performance::NiceEffort => "Nice effort! Practice makes perfect!",
            Performance::KeepPracticing => "Great start! Every practice session makes you stronger!",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(id: &str, selected: usize, correct: usize) -> UserAnswer {
        UserAnswer {
            question_id: id.to_string(),
            selected_answer: selected,
            correct_answer: correct,
            is_correct: selected == correct,
        }
    }

    #[test]
    fn test_results_counts_and_percentage() {
        let results = QuizResults::from_answers(
            3,
            vec![answer("a", 0, 0), answer("b", 1, 2), answer("c", 3, 3)],
        );
        assert_eq!(results.correct_answers, 2);
        assert_eq!(results.incorrect_answers, 1);
        assert_eq!(results.percentage(), 67);
        assert_eq!(results.performance(), Performance::Good);
    }

    #[test]
    fn test_empty_results_have_zero_percentage() {
        let results = QuizResults::from_answers(0, vec![]);
        assert_eq!(results.percentage(), 0);
        assert_eq!(results.performance(), Performance::KeepPracticing);
    }

    #[test]
    fn test_performance_thresholds() {
        assert_eq!(Performance::from_percentage(100), Performance::Perfect);
        assert_eq!(Performance::from_percentage(80), Performance::Excellent);
        assert_eq!(Performance::from_percentage(79), Performance::Good);
        assert_eq!(Performance::from_percentage(60), Performance::Good);
        assert_eq!(Performance::from_percentage(40), Performance::NiceEffort);
        assert_eq!(Performance::from_percentage(39), Performance::KeepPracticing);
        assert_eq!(
            Performance::KeepPracticing.message(),
            "Great start! Every practice session makes you stronger!"
        );
    }

    fn question(id: &str) -> QuizQuestion {
        QuizQuestion {
            id: id.to_string(),
            question: "Which one?".to_string(),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: 1,
            explanation: None,
        }
    }

    #[test]
    fn test_well_formed_quiz_validates() {
        let quiz = Quiz { questions: vec![question("q_1_0"), question("q_1_1")] };
        assert!(quiz.validate().is_ok());
    }

    #[test]
    fn test_quiz_validation_failures() {
        let mut blank_text = question("a");
        blank_text.question = "  ".to_string();
        let mut no_options = question("a");
        no_options.options.clear();
        let mut blank_option = question("a");
        blank_option.options[2] = String::new();
        let mut out_of_range = question("a");
        out_of_range.correct_answer = 9;
        let blank_id = question("");

        for bad in [blank_text, no_options, blank_option, out_of_range, blank_id] {
            let quiz = Quiz { questions: vec![question("ok"), bad] };
            assert!(
                matches!(quiz.validate(), Err(QuizError::QuizValidation { index: 1, .. })),
                "{:?}",
                quiz
            );
        }

        assert!(matches!(
            Quiz { questions: vec![] }.validate(),
            Err(QuizError::QuizValidation { index: 0, .. })
        ));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let quiz = Quiz { questions: vec![question("same"), question("other"), question("same")] };
        match quiz.validate() {
            Err(QuizError::QuizValidation { index, reason }) => {
                assert_eq!(index, 2);
                assert!(reason.contains("duplicate"));
            }
            other => panic!("expected QuizValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_question_serializes_camel_case() {
        let question = QuizQuestion {
            id: "q_1_0".to_string(),
            question: "Q".to_string(),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: 2,
            explanation: None,
        };
        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["correctAnswer"], 2);
        assert!(value.get("explanation").is_none());
        assert_eq!(question.correct_option(), Some("C"));
    }
}
