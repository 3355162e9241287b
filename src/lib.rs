//! prompt-enhancer library - prompt enhancement over a local Ollama server

pub mod config;
pub mod enhancer;
pub mod http_logger;
pub mod service;

// Re-export commonly used types
pub use config::{Config, ConfigOptions};
pub use enhancer::{Enhancement, EnhancerServer, PromptEnhancer, Technique};
pub use service::OllamaError;
