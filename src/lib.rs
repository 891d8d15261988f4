pub mod api;
pub mod config;
pub mod errors;
pub mod generation_client;
pub mod logging;
pub mod models;
pub mod practice;
pub mod quiz_parser;
pub mod quiz_service;

pub use config::{Config, GenerationConfig};
pub use errors::*;
pub use generation_client::{CompletionTransport, GenerationClient, HttpCompletionTransport};
pub use models::*;
pub use practice::{PracticeState, QuizPractice, Transition};
pub use quiz_parser::parse_quiz;
pub use quiz_service::QuizService;
