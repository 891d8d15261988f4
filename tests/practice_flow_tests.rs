use nomi_quiz::{
    ParseFailureKind, PracticeState, QuizError, QuizPractice, Transition, parse_quiz,
};

fn generated(correct: &[usize]) -> String {
    let questions: Vec<String> = correct
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                r#"{{"question": "Fact {i}?", "options": ["w", "x", "y", "z"], "correctAnswer": {c}, "explanation": "Fact {i} explained"}}"#
            )
        })
        .collect();
    format!(r#"{{"questions": [{}]}}"#, questions.join(","))
}

fn play(practice: &mut QuizPractice, choices: &[usize]) {
    for choice in choices {
        practice.select(*choice);
        practice.submit();
        practice.next();
    }
}

#[test]
fn test_parsed_quiz_drives_practice_to_results() {
    let quiz = parse_quiz(&format!("```json\n{}\n```", generated(&[0, 1]))).unwrap();
    let mut practice = QuizPractice::new(quiz);

    play(&mut practice, &[0, 1]);

    let results = practice.results().unwrap();
    assert_eq!(results.total_questions, 2);
    assert_eq!(results.correct_answers, 2);
    assert_eq!(results.incorrect_answers, 0);
    assert_eq!(results.percentage(), 100);
}

#[test]
fn test_wrong_answers_scenario() {
    let quiz = parse_quiz(&generated(&[0, 1])).unwrap();
    let mut practice = QuizPractice::new(quiz);

    play(&mut practice, &[1, 0]);

    let results = practice.results().unwrap();
    assert_eq!(results.correct_answers, 0);
    assert_eq!(results.incorrect_answers, 2);
}

#[test]
fn test_answers_reference_parsed_ids() {
    let quiz = parse_quiz(&generated(&[2, 3, 0])).unwrap();
    let ids: Vec<String> = quiz.questions.iter().map(|q| q.id.clone()).collect();
    let mut practice = QuizPractice::new(quiz);

    play(&mut practice, &[2, 2, 2]);

    let results = practice.results().unwrap();
    let answered: Vec<String> = results.answers.iter().map(|a| a.question_id.clone()).collect();
    assert_eq!(answered, ids);
    assert_eq!(results.answers.len(), results.total_questions);
}

#[test]
fn test_straight_through_for_many_sizes() {
    for n in 1..=8 {
        let correct: Vec<usize> = (0..n).map(|i| i % 4).collect();
        let choices: Vec<usize> = (0..n).map(|i| (i * 3) % 4).collect();
        let mut practice = QuizPractice::new(parse_quiz(&generated(&correct)).unwrap());

        play(&mut practice, &choices);

        let results = practice.results().unwrap();
        assert_eq!(practice.state(), PracticeState::Completed);
        assert_eq!(results.answers.len(), n);
        assert_eq!(results.total_questions, n);
        assert_eq!(results.correct_answers + results.incorrect_answers, n);
    }
}

#[test]
fn test_back_then_forward_keeps_answer_count() {
    let mut practice = QuizPractice::new(parse_quiz(&generated(&[0, 1, 2])).unwrap());
    play(&mut practice, &[0, 1]);
    practice.select(2);
    practice.submit();

    assert_eq!(practice.previous(), Transition::Ok);
    assert_eq!(practice.previous(), Transition::Ok);
    assert_eq!(practice.previous(), Transition::Ignored);
    assert_eq!(practice.answered_count(), 3);

    practice.next();
    practice.next();
    practice.next();
    assert_eq!(practice.results().unwrap().answers.len(), 3);
    assert_eq!(practice.results().unwrap().correct_answers, 3);
}

#[test]
fn test_fence_wrapping_gives_same_questions() {
    let bare = parse_quiz(&generated(&[1, 3])).unwrap();
    let fenced = parse_quiz(&format!("```json\n{}\n```", generated(&[1, 3]))).unwrap();

    assert_eq!(bare.len(), fenced.len());
    for (a, b) in bare.questions.iter().zip(&fenced.questions) {
        assert_eq!(a.question, b.question);
        assert_eq!(a.options, b.options);
        assert_eq!(a.correct_answer, b.correct_answer);
        assert_eq!(a.explanation, b.explanation);
        assert_ne!(a.id, b.id);
    }
}

#[test]
fn test_parse_failures() {
    assert!(matches!(
        parse_quiz("not json"),
        Err(QuizError::QuizParse { kind: ParseFailureKind::Syntax, .. })
    ));
    assert!(matches!(
        parse_quiz(r#"{"quiz": []}"#),
        Err(QuizError::QuizParse { kind: ParseFailureKind::Shape, .. })
    ));
    assert!(matches!(
        parse_quiz(r#"{"questions":[{"question":"Q","options":["A","B","C","D","E"],"correctAnswer":0}]}"#),
        Err(QuizError::QuizValidation { index: 0, .. })
    ));
}
