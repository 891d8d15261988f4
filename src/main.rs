use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use nomi_quiz::{
    api::{AppState, create_router},
    config::{Config, LoggingConfig},
    generation_client::GenerationClient,
    log_system_event,
    quiz_service::QuizService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = setup_logging(&LoggingConfig::from_env())?;

    let config = Config::from_env()?;
    config.validate()?;

    log_system_event!(startup, component = "server", "Starting Nomi quiz server");

    let client = GenerationClient::new(config.generation.clone());
    let quiz_service = QuizService::new(client);
    info!(
        model = %quiz_service.model_name(),
        combinations = config.generation.attempt_count(),
        "Initialized quiz generation service"
    );

    let state = AppState::new(quiz_service);

    let app = create_router(state).layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn setup_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use std::fs;
    use tracing_subscriber::fmt;

    let env_filter =
        EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info,nomi_quiz=debug"));

    let console_layer = logging.console_enabled.then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(true)
    });

    let mut guard = None;
    let file_layer = if logging.file_enabled {
        fs::create_dir_all(&logging.log_directory).unwrap_or_else(|e| {
            eprintln!("Warning: Could not create logs directory: {}", e);
        });

        // Daily rotation, no ANSI colors in files
        let file_appender = tracing_appender::rolling::daily(&logging.log_directory, "nomi-quiz.log");
        let (non_blocking_file, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        Some(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(non_blocking_file),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!(
        directory = %logging.log_directory,
        file_enabled = logging.file_enabled,
        "Logging initialized"
    );

    Ok(guard)
}
