// Macros file - tracing macros are imported within the macro definitions

/// Standardized logging macros for consistent field names and message patterns across the application
///
/// These macros ensure:
/// - Consistent field naming conventions
/// - Appropriate logging levels for different scenarios
/// - Structured logging with context

// ============================================================================
// API Operation Logging Macros
// ============================================================================

/// Log the start of an API operation with consistent fields
#[macro_export]
macro_rules! log_api_start {
    ($operation:expr, session_id = $session_id:expr) => {
        tracing::debug!(
            operation = $operation,
            session_id = %$session_id,
            "API operation started"
        );
    };
    ($operation:expr) => {
        tracing::debug!(
            operation = $operation,
            "API operation started"
        );
    };
}

/// Log successful completion of an API operation
#[macro_export]
macro_rules! log_api_success {
    ($operation:expr, session_id = $session_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            session_id = %$session_id,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, count = $count:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            count = $count,
            "API operation completed: {}", $msg
        );
    };
}

/// Log API warnings with context
#[macro_export]
macro_rules! log_api_warn {
    ($operation:expr, session_id = $session_id:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            session_id = %$session_id,
            "API operation warning: {}", $msg
        );
    };
}

// ============================================================================
// Generation Logging Macros
// ============================================================================

/// Log one (credential, endpoint) attempt of the fallback loop
#[macro_export]
macro_rules! log_generation_attempt {
    (start, attempt = $attempt:expr, endpoint = $endpoint:expr, credential = $credential:expr) => {
        tracing::debug!(
            component = "generation_client",
            attempt = $attempt,
            endpoint = %$endpoint,
            credential = %$credential,
            "Generation attempt started"
        );
    };
    (success, attempt = $attempt:expr, endpoint = $endpoint:expr, duration_ms = $duration:expr, response_length = $len:expr) => {
        tracing::info!(
            component = "generation_client",
            attempt = $attempt,
            endpoint = %$endpoint,
            duration_ms = $duration,
            response_length = $len,
            "Generation attempt succeeded"
        );
    };
    (failure, attempt = $attempt:expr, endpoint = $endpoint:expr, credential = $credential:expr, error = $error:expr) => {
        tracing::warn!(
            component = "generation_client",
            attempt = $attempt,
            endpoint = %$endpoint,
            credential = %$credential,
            error = %$error,
            "Generation attempt failed, trying next combination"
        );
    };
}

// ============================================================================
// System Event Logging Macros
// ============================================================================

/// Log system startup and shutdown events
#[macro_export]
macro_rules! log_system_event {
    (startup, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "startup",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (config, $msg:expr) => {
        tracing::info!(event_type = "configuration", "System event: {}", $msg);
    };
}

// ============================================================================
// Validation Logging Macros
// ============================================================================

/// Log validation results consistently
#[macro_export]
macro_rules! log_validation {
    (success, $component:expr, $msg:expr) => {
        tracing::debug!(
            event_type = "validation",
            component = $component,
            result = "success",
            "Validation completed: {}", $msg
        );
    };
    (failure, $component:expr, error = $error:expr) => {
        tracing::warn!(
            event_type = "validation",
            component = $component,
            result = "failure",
            error = %$error,
            "Validation failed"
        );
    };
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    #[test]
    fn test_logging_macros_compile() {
        let session_id = Uuid::new_v4();
        let error = anyhow::anyhow!("test error");

        log_api_start!("test_operation", session_id = session_id);
        log_api_start!("test_operation");

        log_api_success!("test_operation", session_id = session_id, "session created");
        log_api_success!("test_operation", count = 5, "questions generated");

        log_api_warn!("test_operation", session_id = session_id, "transition ignored");

        log_generation_attempt!(
            start,
            attempt = 1,
            endpoint = "https://example.test/v1/chat/completions",
            credential = "abcd***wxyz"
        );
        log_generation_attempt!(
            success,
            attempt = 1,
            endpoint = "https://example.test/v1/chat/completions",
            duration_ms = 1500u64,
            response_length = 42usize
        );
        log_generation_attempt!(
            failure,
            attempt = 2,
            endpoint = "https://example.test/v1/chat/completions",
            credential = "abcd***wxyz",
            error = error
        );

        log_system_event!(startup, component = "server", "server starting");
        log_system_event!(config, "configuration loaded successfully");

        log_validation!(success, "quiz_parser", "quiz validated");
        log_validation!(failure, "quiz_parser", error = "bad option count");
    }
}
