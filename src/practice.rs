use serde::Serialize;
use tracing::debug;

use crate::models::{Quiz, QuizQuestion, QuizResults, UserAnswer};

/// Where the current question is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeState {
    /// Question shown, nothing chosen
    Presenting,
    /// An option is chosen but not submitted
    Selected,
    /// Answer locked in; correctness and explanation are visible
    Answered,
    /// Every question answered and results computed
    Completed,
}

/// Outcome of a practice event. Illegal events leave the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Ok,
    Ignored,
}

/// Drives one user through a quiz, one question at a time.
///
/// Answers are kept per question position and replaced in place when a question is
/// revised, so there is never more than one recorded answer per question.
#[derive(Debug, Clone)]
pub struct QuizPractice {
    quiz: Quiz,
    index: usize,
    state: PracticeState,
    selection: Option<usize>,
    answers: Vec<Option<UserAnswer>>,
    results: Option<QuizResults>,
}

impl QuizPractice {
    /// Start at the first question. An empty quiz is complete immediately.
    pub fn new(quiz: Quiz) -> Self {
        let total = quiz.len();
        let mut practice = Self {
            quiz,
            index: 0,
            state: PracticeState::Presenting,
            selection: None,
            answers: vec![None; total],
            results: None,
        };
        if total == 0 {
            practice.finish();
        }
        practice
    }

    pub fn select(&mut self, option: usize) -> Transition {
        let in_range = self
            .current_question()
            .is_some_and(|q| option < q.options.len());

        match self.state {
            PracticeState::Presenting | PracticeState::Selected if in_range => {
                self.selection = Some(option);
                self.state = PracticeState::Selected;
                Transition::Ok
            }
            _ => self.ignore("select"),
        }
    }

    pub fn submit(&mut self) -> Transition {
        let (PracticeState::Selected, Some(selected)) = (self.state, self.selection) else {
            return self.ignore("submit");
        };
        let Some(question) = self.quiz.question(self.index) else {
            return self.ignore("submit");
        };

        let answer = UserAnswer::for_question(question, selected);
        debug!(
            question_id = %answer.question_id,
            selected = answer.selected_answer,
            is_correct = answer.is_correct,
            "Answer recorded"
        );
        self.answers[self.index] = Some(answer);
        self.state = PracticeState::Answered;
        Transition::Ok
    }

    pub fn next(&mut self) -> Transition {
        if self.state != PracticeState::Answered {
            return self.ignore("next");
        }

        if self.is_last_question() {
            self.finish();
        } else {
            self.move_to(self.index + 1);
        }
        Transition::Ok
    }

    pub fn previous(&mut self) -> Transition {
        if self.state != PracticeState::Answered || self.index == 0 {
            return self.ignore("previous");
        }

        self.move_to(self.index - 1);
        Transition::Ok
    }

    /// Reopen an answered question so a different option can be submitted.
    pub fn revise(&mut self) -> Transition {
        if self.state != PracticeState::Answered {
            return self.ignore("revise");
        }

        self.state = PracticeState::Selected;
        Transition::Ok
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn state(&self) -> PracticeState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.quiz.question(self.index)
    }

    pub fn total_questions(&self) -> usize {
        self.quiz.len()
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn explanation_visible(&self) -> bool {
        self.state == PracticeState::Answered
    }

    pub fn current_answer(&self) -> Option<&UserAnswer> {
        self.answers.get(self.index).and_then(Option::as_ref)
    }

    pub fn is_last_question(&self) -> bool {
        self.index + 1 >= self.quiz.len()
    }

    pub fn is_complete(&self) -> bool {
        self.state == PracticeState::Completed
    }

    /// Position through the quiz as a percentage, counting the current question.
    pub fn progress(&self) -> f64 {
        if self.quiz.is_empty() {
            return 100.0;
        }
        ((self.index + 1) as f64 / self.quiz.len() as f64) * 100.0
    }

    /// Recorded answers in question order
    pub fn answers(&self) -> Vec<&UserAnswer> {
        self.answers.iter().flatten().collect()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn results(&self) -> Option<&QuizResults> {
        self.results.as_ref()
    }

    // Lands on `index`, restoring its recorded answer if there is one.
    fn move_to(&mut self, index: usize) {
        self.index = index;
        match self.answers.get(index).and_then(Option::as_ref) {
            Some(answer) => {
                self.selection = Some(answer.selected_answer);
                self.state = PracticeState::Answered;
            }
            None => {
                self.selection = None;
                self.state = PracticeState::Presenting;
            }
        }
    }

    fn finish(&mut self) {
        let recorded = self.answers.iter().flatten().cloned().collect();
        let results = QuizResults::from_answers(self.quiz.len(), recorded);
        debug!(
            total = results.total_questions,
            correct = results.correct_answers,
            "Practice completed"
        );
        self.results = Some(results);
        self.state = PracticeState::Completed;
    }

    fn ignore(&self, event: &'static str) -> Transition {
        debug!(event = event, state = ?self.state, index = self.index, "Practice event ignored");
        Transition::Ignored
    }
}
