use crate::api::ApiResponse;
use axum::{http::StatusCode, response::Json};
use serde::Serialize;
use tracing::{error, info, warn};

/// Errors surfaced by the quiz generation pipeline
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuizError {
    #[error("All {attempts} generation attempts failed: {message}")]
    GenerationUnavailable { attempts: usize, message: String },

    #[error("Failed to parse quiz ({kind}): {message}")]
    QuizParse {
        kind: ParseFailureKind,
        message: String,
    },

    #[error("Invalid quiz question {index}: {reason}")]
    QuizValidation { index: usize, reason: String },

    #[error("Notes must be at least {minimum} characters (got {actual})")]
    NotesTooShort { minimum: usize, actual: usize },

    #[error("Question count must be between 1 and {maximum} (got {requested})")]
    InvalidQuestionCount { requested: usize, maximum: usize },
}

/// Whether the generated text was not JSON at all, or JSON of the wrong shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailureKind {
    Syntax,
    Shape,
}

impl std::fmt::Display for ParseFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseFailureKind::Syntax => write!(f, "not valid JSON"),
            ParseFailureKind::Shape => write!(f, "unexpected JSON shape"),
        }
    }
}

impl From<serde_json::Error> for QuizError {
    fn from(err: serde_json::Error) -> Self {
        let kind = match err.classify() {
            serde_json::error::Category::Data => ParseFailureKind::Shape,
            _ => ParseFailureKind::Syntax,
        };
        QuizError::QuizParse {
            kind,
            message: err.to_string(),
        }
    }
}

/// A single failed (credential, endpoint) attempt. Always recoverable by the fallback loop.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttemptError {
    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode completion response: {0}")]
    Decode(String),

    #[error("No choices in completion response")]
    NoChoices,
}

impl From<reqwest::Error> for AttemptError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AttemptError::Decode(err.to_string())
        } else {
            AttemptError::Transport(err.to_string())
        }
    }
}

/// Centralized error types for consistent API error handling
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Generation service unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Generated quiz was unusable: {0}")]
    BadUpstreamContent(String),
}

impl From<QuizError> for ApiError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::GenerationUnavailable { .. } => ApiError::GenerationUnavailable(err.to_string()),
            QuizError::QuizParse { .. } | QuizError::QuizValidation { .. } => {
                ApiError::BadUpstreamContent(err.to_string())
            }
            QuizError::NotesTooShort { .. } | QuizError::InvalidQuestionCount { .. } => {
                ApiError::ValidationError(err.to_string())
            }
        }
    }
}

/// Error context for structured logging
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub resource_id: Option<String>,
    pub resource_type: String,
}

impl ErrorContext {
    pub fn new(operation: &str, resource_type: &str) -> Self {
        Self {
            operation: operation.to_string(),
            resource_id: None,
            resource_type: resource_type.to_string(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::GenerationUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadUpstreamContent(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Convert API error to HTTP response with consistent structure and logging
    pub fn to_response_with_context(
        self,
        context: ErrorContext,
    ) -> (StatusCode, Json<ApiResponse<()>>) {
        let status = self.status_code();
        match &self {
            ApiError::NotFound(_) => {
                info!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Resource not found"
                );
                (
                    status,
                    Json(ApiResponse::error(format!("{} not found", context.resource_type))),
                )
            }
            ApiError::ValidationError(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Validation error"
                );
                (status, Json(ApiResponse::error(self.to_string())))
            }
            ApiError::GenerationUnavailable(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    error = %self,
                    "Generation service unavailable"
                );
                (
                    status,
                    Json(ApiResponse::error(
                        "Quiz generation is temporarily unavailable. Please try again.".to_string(),
                    )),
                )
            }
            ApiError::BadUpstreamContent(_) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    error = %self,
                    "Upstream produced unusable quiz content"
                );
                (status, Json(ApiResponse::error(self.to_string())))
            }
        }
    }
}
