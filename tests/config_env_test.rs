//! Tests for config resolution from the environment
//!
//! Kept to a single test in its own binary: environment variables are
//! process-wide and the other config tests run in parallel threads.

use prompt_enhancer::config::{
    Config, ConfigOptions, DEFAULT_MODEL, DEFAULT_OLLAMA_URL, ENV_ENHANCER_MODEL, ENV_OLLAMA_HOST,
};

#[test]
fn test_flag_then_env_then_default() {
    // Environment fills unset options, with Ollama's default port applied
    std::env::set_var(ENV_OLLAMA_HOST, "127.0.0.1");
    std::env::set_var(ENV_ENHANCER_MODEL, "mistral");

    let config = Config::new(ConfigOptions::default()).unwrap();
    assert_eq!(config.ollama_url, "http://127.0.0.1:11434");
    assert_eq!(config.default_model, "mistral");

    std::env::set_var(ENV_OLLAMA_HOST, ":11434");
    let config = Config::new(ConfigOptions::default()).unwrap();
    assert_eq!(config.ollama_url, "http://127.0.0.1:11434");

    std::env::set_var(ENV_OLLAMA_HOST, "0.0.0.0");
    let config = Config::new(ConfigOptions::default()).unwrap();
    assert_eq!(config.ollama_url, "http://0.0.0.0:11434");

    // Explicit options win over the environment
    let config = Config::new(ConfigOptions {
        ollama_url: Some("http://gpu-box:8080".to_string()),
        default_model: Some("phi3".to_string()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(config.ollama_url, "http://gpu-box:8080");
    assert_eq!(config.default_model, "phi3");

    // Blank values count as unset
    std::env::set_var(ENV_OLLAMA_HOST, "   ");
    std::env::set_var(ENV_ENHANCER_MODEL, "");
    let config = Config::new(ConfigOptions::default()).unwrap();
    assert_eq!(config.ollama_url, DEFAULT_OLLAMA_URL);
    assert_eq!(config.default_model, DEFAULT_MODEL);

    std::env::remove_var(ENV_OLLAMA_HOST);
    std::env::remove_var(ENV_ENHANCER_MODEL);
    let config = Config::new(ConfigOptions::default()).unwrap();
    assert_eq!(config.ollama_url, "http://localhost:11434");
    assert_eq!(config.default_model, "llama3");
}
