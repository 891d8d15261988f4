use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::{
    errors::{ApiError, ErrorContext},
    models::{Performance, Quiz, QuizQuestion, QuizResults, UserAnswer},
    practice::{PracticeState, QuizPractice, Transition},
    quiz_service::QuizService,
};

// Import logging macros
use crate::{log_api_start, log_api_success, log_api_warn};

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: QuizService,
    pub practice_sessions: Arc<Mutex<HashMap<Uuid, QuizPractice>>>,
}

impl AppState {
    pub fn new(quiz_service: QuizService) -> Self {
        Self {
            quiz_service,
            practice_sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<Uuid, QuizPractice>> {
        // A poisoned lock only means a handler panicked mid-update; the map itself is still usable.
        self.practice_sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuizRequest {
    pub notes: String,
    pub question_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct StartPracticeRequest {
    pub quiz: Quiz,
}

#[derive(Debug, Deserialize)]
pub struct SelectOptionRequest {
    pub option: usize,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// A question as shown mid-practice; the answer key is withheld until the answer is locked in
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionView {
    fn new(question: &QuizQuestion, reveal: bool) -> Self {
        Self {
            id: question.id.clone(),
            question: question.question.clone(),
            options: question.options.clone(),
            correct_answer: reveal.then_some(question.correct_answer),
            explanation: question.explanation.clone().filter(|_| reveal),
        }
    }
}

/// What a practice screen needs to render the current step
#[derive(Debug, Serialize)]
pub struct PracticeView {
    pub session_id: Uuid,
    pub state: PracticeState,
    pub current_index: usize,
    pub total_questions: usize,
    pub progress: f64,
    pub is_last_question: bool,
    pub question: Option<QuestionView>,
    pub selected_option: Option<usize>,
    pub explanation_visible: bool,
    pub current_answer: Option<UserAnswer>,
    pub answered_count: usize,
}

impl PracticeView {
    fn new(session_id: Uuid, practice: &QuizPractice) -> Self {
        let reveal = practice.explanation_visible();
        let question = practice
            .current_question()
            .map(|q| QuestionView::new(q, reveal));

        Self {
            session_id,
            state: practice.state(),
            current_index: practice.current_index(),
            total_questions: practice.total_questions(),
            progress: practice.progress(),
            is_last_question: practice.is_last_question(),
            question,
            selected_option: practice.selection(),
            explanation_visible: practice.explanation_visible(),
            current_answer: practice.current_answer().cloned(),
            answered_count: practice.answered_count(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub transition: Transition,
    pub session: PracticeView,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    #[serde(flatten)]
    pub results: QuizResults,
    pub percentage: u32,
    pub performance: Performance,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub active_sessions: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let active_sessions = state.sessions().len();
    Json(ApiResponse::success(HealthResponse {
        status: "ok",
        model: state.quiz_service.model_name().to_string(),
        active_sessions,
    }))
}

pub async fn generate_quiz(
    State(state): State<AppState>,
    Json(request): Json<GenerateQuizRequest>,
) -> ApiResult<Quiz> {
    log_api_start!("generate_quiz");

    match state
        .quiz_service
        .generate_quiz_from_notes(&request.notes, request.question_count)
        .await
    {
        Ok(quiz) => {
            log_api_success!("generate_quiz", count = quiz.len(), "quiz generated");
            Ok(Json(ApiResponse::success(quiz)))
        }
        Err(e) => {
            let context = ErrorContext::new("generate_quiz", "quiz");
            Err(ApiError::from(e).to_response_with_context(context))
        }
    }
}

pub async fn start_practice(
    State(state): State<AppState>,
    Json(request): Json<StartPracticeRequest>,
) -> ApiResult<PracticeView> {
    log_api_start!("start_practice");

    // Client-supplied quizzes are bad input here, not bad upstream content.
    if let Err(e) = request.quiz.validate() {
        let error = ApiError::ValidationError(e.to_string());
        return Err(error.to_response_with_context(ErrorContext::new("start_practice", "practice_session")));
    }

    let session_id = Uuid::new_v4();
    let practice = QuizPractice::new(request.quiz);
    let view = PracticeView::new(session_id, &practice);
    state.sessions().insert(session_id, practice);

    log_api_success!("start_practice", session_id = session_id, "practice session started");
    Ok(Json(ApiResponse::success(view)))
}

pub async fn get_practice(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<PracticeView> {
    log_api_start!("get_practice", session_id = session_id);

    let sessions = state.sessions();
    match sessions.get(&session_id) {
        Some(practice) => Ok(Json(ApiResponse::success(PracticeView::new(session_id, practice)))),
        None => Err(session_not_found("get_practice", session_id)),
    }
}

pub async fn select_option(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectOptionRequest>,
) -> ApiResult<TransitionResponse> {
    apply_event(&state, session_id, "select_option", |p| p.select(request.option))
}

pub async fn submit_answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<TransitionResponse> {
    apply_event(&state, session_id, "submit_answer", QuizPractice::submit)
}

pub async fn next_question(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<TransitionResponse> {
    apply_event(&state, session_id, "next_question", QuizPractice::next)
}

pub async fn previous_question(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<TransitionResponse> {
    apply_event(&state, session_id, "previous_question", QuizPractice::previous)
}

pub async fn revise_answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<TransitionResponse> {
    apply_event(&state, session_id, "revise_answer", QuizPractice::revise)
}

pub async fn get_results(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<ResultsResponse> {
    log_api_start!("get_results", session_id = session_id);

    let sessions = state.sessions();
    let Some(practice) = sessions.get(&session_id) else {
        return Err(session_not_found("get_results", session_id));
    };

    match practice.results() {
        Some(results) => {
            let performance = results.performance();
            Ok(Json(ApiResponse::success(ResultsResponse {
                results: results.clone(),
                percentage: results.percentage(),
                performance,
                message: performance.message(),
            })))
        }
        None => {
            log_api_warn!("get_results", session_id = session_id, "results requested before completion");
            let error = ApiError::NotFound(format!("Results for session '{}' not ready", session_id));
            let context = ErrorContext::new("get_results", "results").with_id(&session_id.to_string());
            Err(error.to_response_with_context(context))
        }
    }
}

pub async fn end_practice(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<()> {
    log_api_start!("end_practice", session_id = session_id);

    match state.sessions().remove(&session_id) {
        Some(_) => {
            log_api_success!("end_practice", session_id = session_id, "practice session removed");
            Ok(Json(ApiResponse::success(())))
        }
        None => Err(session_not_found("end_practice", session_id)),
    }
}

fn apply_event<F>(
    state: &AppState,
    session_id: Uuid,
    operation: &'static str,
    event: F,
) -> ApiResult<TransitionResponse>
where
    F: FnOnce(&mut QuizPractice) -> Transition,
{
    log_api_start!(operation, session_id = session_id);

    let mut sessions = state.sessions();
    let Some(practice) = sessions.get_mut(&session_id) else {
        return Err(session_not_found(operation, session_id));
    };

    let transition = event(practice);
    if transition == Transition::Ignored {
        log_api_warn!(operation, session_id = session_id, "transition ignored in current state");
    }

    Ok(Json(ApiResponse::success(TransitionResponse {
        transition,
        session: PracticeView::new(session_id, practice),
    })))
}

fn session_not_found(operation: &str, session_id: Uuid) -> (StatusCode, Json<ApiResponse<()>>) {
    let error = ApiError::NotFound(format!("Practice session '{}' not found", session_id));
    let context = ErrorContext::new(operation, "practice_session").with_id(&session_id.to_string());
    error.to_response_with_context(context)
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        // Quiz generation
        .route("/api/quizzes", post(generate_quiz))
        // Practice sessions
        .route("/api/practice", post(start_practice))
        .route("/api/practice/:id", get(get_practice).delete(end_practice))
        .route("/api/practice/:id/select", post(select_option))
        .route("/api/practice/:id/submit", post(submit_answer))
        .route("/api/practice/:id/next", post(next_question))
        .route("/api/practice/:id/previous", post(previous_question))
        .route("/api/practice/:id/revise", post(revise_answer))
        .route("/api/practice/:id/results", get(get_results))
        .with_state(state)
}
