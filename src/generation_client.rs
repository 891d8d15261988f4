use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::config::{GenerationConfig, mask_sensitive_data};
use crate::errors::{AttemptError, QuizError};

// Import logging macros
use crate::log_generation_attempt;

/// Common message structure for chat completion requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

/// Reply side of a choice; only `content` is required, `role` is often omitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub content: String,
}

impl CompletionMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            role: None,
            content: content.into(),
        }
    }
}

/// Sends one completion request to one endpoint with one credential
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send(
        &self,
        endpoint: &str,
        credential: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, AttemptError>;
}

/// reqwest-backed transport speaking the OpenAI-compatible chat completions protocol
#[derive(Debug, Clone, Default)]
pub struct HttpCompletionTransport {
    client: Client,
}

impl HttpCompletionTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl CompletionTransport for HttpCompletionTransport {
    async fn send(
        &self,
        endpoint: &str,
        credential: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, AttemptError> {
        let response = self
            .client
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", credential))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                endpoint = %endpoint,
                status = %status,
                error = %body,
                "Completion API request failed"
            );
            return Err(AttemptError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<CompletionResponse>(&body)
            .map_err(|e| AttemptError::Decode(e.to_string()))
    }
}

/// Completion client that masks failures of individual credentials and endpoints
/// by trying every (credential, endpoint) pair in order until one answers.
#[derive(Clone)]
pub struct GenerationClient {
    config: GenerationConfig,
    transport: Arc<dyn CompletionTransport>,
}

impl GenerationClient {
    pub fn new(config: GenerationConfig) -> Self {
        Self::with_transport(config, Arc::new(HttpCompletionTransport::new()))
    }

    pub fn with_transport(config: GenerationConfig, transport: Arc<dyn CompletionTransport>) -> Self {
        Self { config, transport }
    }

    pub fn model_name(&self) -> &str {
        &self.config.model
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn build_request(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_tokens,
        }
    }

    /// Return the first completion text any pair produces.
    ///
    /// Credentials form the outer loop and endpoints the inner one. A non-success status,
    /// a transport failure or an empty `choices` list moves on to the next pair; only when
    /// every pair has failed does this return `GenerationUnavailable` with the last failure.
    pub async fn generate(&self, prompt: &str) -> Result<String, QuizError> {
        let request = self.build_request(prompt);
        let total = self.config.attempt_count();

        info!(
            model = %self.config.model,
            prompt_length = prompt.len(),
            combinations = total,
            "Requesting completion"
        );

        let mut attempt = 0usize;
        let mut last_error: Option<AttemptError> = None;

        for credential in &self.config.credentials {
            let masked = mask_sensitive_data(credential);
            for endpoint in &self.config.endpoints {
                attempt += 1;
                log_generation_attempt!(start, attempt = attempt, endpoint = endpoint, credential = masked);

                let started = Instant::now();
                let outcome = self
                    .transport
                    .send(endpoint, credential, &request)
                    .await
                    .and_then(first_choice);

                match outcome {
                    Ok(text) => {
                        log_generation_attempt!(
                            success,
                            attempt = attempt,
                            endpoint = endpoint,
                            duration_ms = started.elapsed().as_millis() as u64,
                            response_length = text.len()
                        );
                        return Ok(text);
                    }
                    Err(e) => {
                        log_generation_attempt!(
                            failure,
                            attempt = attempt,
                            endpoint = endpoint,
                            credential = masked,
                            error = e
                        );
                        last_error = Some(e);
                    }
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no credential/endpoint pairs configured".to_string());

        error!(attempts = attempt, error = %message, "All completion attempts failed");

        Err(QuizError::GenerationUnavailable {
            attempts: attempt,
            message,
        })
    }
}

fn first_choice(response: CompletionResponse) -> Result<String, AttemptError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or(AttemptError::NoChoices)
}
