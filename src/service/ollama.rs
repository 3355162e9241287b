//! Ollama API service
//!
//! Thin client over the two endpoints the enhancer needs:
//! `GET /api/tags` to discover models and `POST /api/generate` for completions.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::http_logger::{self, HttpResponseLog};

/// Model reported when Ollama is reachable but has nothing pulled
pub const FALLBACK_MODEL: &str = "llama3:latest";

/// Text returned when a generate response carries no `response` field
pub const NO_RESPONSE_PLACEHOLDER: &str = "[No response from Ollama]";

/// Errors talking to the Ollama server
#[derive(Debug, Error)]
pub enum OllamaError {
    #[error("Ollama request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Ollama returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to parse Ollama response: {source} - {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    #[serde(default)]
    name: String,
}

pub fn build_tags_url(base_url: &str) -> String {
    format!("{}/api/tags", base_url.trim_end_matches('/'))
}

pub fn build_generate_url(base_url: &str) -> String {
    format!("{}/api/generate", base_url.trim_end_matches('/'))
}

/// List the models available on the local Ollama instance, sorted by name.
///
/// An instance with no models yields `[FALLBACK_MODEL]` so the UI always has
/// something to select.
pub async fn list_models(client: &Client, config: &Config) -> Result<Vec<String>, OllamaError> {
    let url = build_tags_url(&config.ollama_url);
    let request_id = Uuid::new_v4().to_string();
    let request_log = http_logger::build_request_log_if_enabled("GET", &url, &request_id, None);

    debug!("Fetching Ollama models: {}", url);
    let start_time = Instant::now();
    let result = client
        .get(&url)
        .timeout(Duration::from_secs(config.models_timeout_secs))
        .send()
        .await;

    let body = read_checked(result, request_log, start_time).await?;
    let tags: TagsResponse = serde_json::from_str(&body)
        .map_err(|source| OllamaError::Decode { source, body })?;

    let mut models: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
    models.sort();

    if models.is_empty() {
        return Ok(vec![FALLBACK_MODEL.to_string()]);
    }
    Ok(models)
}

/// Run a single non-streaming completion and return the trimmed response text
pub async fn generate(
    client: &Client,
    config: &Config,
    model: &str,
    prompt: &str,
) -> Result<String, OllamaError> {
    let url = build_generate_url(&config.ollama_url);
    let payload = GenerateRequest {
        model,
        prompt,
        stream: false,
    };

    let request_id = Uuid::new_v4().to_string();
    let request_log = if http_logger::is_enabled() {
        let body = serde_json::to_string(&payload).ok();
        Some(http_logger::build_request_log(
            "POST",
            &url,
            &request_id,
            body.as_deref(),
        ))
    } else {
        None
    };

    info!("Calling Ollama generate: model={}", model);
    let start_time = Instant::now();
    let result = client
        .post(&url)
        .timeout(Duration::from_secs(config.generate_timeout_secs))
        .json(&payload)
        .send()
        .await;

    let body = read_checked(result, request_log, start_time).await?;
    info!(
        "Ollama generate completed in {}ms",
        start_time.elapsed().as_millis()
    );

    let parsed: GenerateResponse = serde_json::from_str(&body)
        .map_err(|source| OllamaError::Decode { source, body })?;

    Ok(parsed
        .response
        .map(|r| r.trim().to_string())
        .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_string()))
}

/// Read a response body, logging the exchange and rejecting non-2xx statuses
async fn read_checked(
    result: Result<reqwest::Response, reqwest::Error>,
    request_log: Option<http_logger::HttpRequestLog>,
    start_time: Instant,
) -> Result<String, OllamaError> {
    let resp = match result {
        Ok(resp) => resp,
        Err(e) => {
            if let Some(req) = &request_log {
                let duration_ms = start_time.elapsed().as_millis() as u64;
                http_logger::log_request(req, None, duration_ms, Some(&e.to_string()));
            }
            return Err(OllamaError::Request(e));
        }
    };

    let status = resp.status();
    let headers = request_log
        .as_ref()
        .map(|_| http_logger::extract_response_headers(&resp));
    let body = resp.text().await?;

    if let (Some(req), Some(headers)) = (&request_log, headers) {
        let duration_ms = start_time.elapsed().as_millis() as u64;
        let resp_log = HttpResponseLog {
            status: status.as_u16(),
            headers,
            body: Some(body.clone()),
        };
        http_logger::log_request(req, Some(&resp_log), duration_ms, None);
    }

    if !status.is_success() {
        return Err(OllamaError::Status { status, body });
    }
    Ok(body)
}
