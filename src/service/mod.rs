//! Service modules for the local model server

pub mod ollama;

pub use ollama::{
    generate, list_models, OllamaError, FALLBACK_MODEL, NO_RESPONSE_PLACEHOLDER,
};
