//! Prompt Enhancer - Core enhancement logic
//!
//! Template techniques are rendered locally. `ai_rewrite` and automatic
//! strategy selection call the local Ollama server.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Local;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::Config;
use crate::service::ollama;

use super::analysis::{analyze_prompt, PromptAnalysis};
use super::techniques::{render, Technique, TechniqueParams};
use super::templates::{critique_prompt, rewrite_prompt, strategy_selection_prompt};

/// Prompts longer than this many words skip model-driven selection and go
/// straight to `ai_rewrite`
pub const AUTO_REWRITE_WORD_THRESHOLD: usize = 15;

/// Technique used when the model's choice cannot be matched
pub const FALLBACK_TECHNIQUE: Technique = Technique::XmlStructure;

/// Number of history entries retained per enhancer
pub const MAX_HISTORY: usize = 100;

pub(crate) const EMPTY_ENHANCE_PROMPT: &str = "Please enter a prompt to enhance.";
pub(crate) const EMPTY_GENERATE_PROMPT: &str = "Prompt is required";

/// Result of enhancing a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enhancement {
    pub technique: Technique,
    pub enhanced_prompt: String,
    /// Only produced by `ai_rewrite`
    pub critique: Option<String>,
}

/// One recorded enhancement
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: String,
    pub original: String,
    pub enhanced: String,
    pub technique: Technique,
    pub parameters: TechniqueParams,
}

/// Models reported by Ollama; `connected` is false when it could not be reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelListing {
    pub models: Vec<String>,
    pub connected: bool,
}

/// Prompt Enhancer
pub struct PromptEnhancer {
    config: Arc<Config>,
    client: Client,
    history: Mutex<VecDeque<HistoryEntry>>,
}

impl PromptEnhancer {
    /// Create a new PromptEnhancer
    pub fn new(config: Arc<Config>) -> Result<Self> {
        // Per-request timeouts come from the config; this only bounds connects
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            config,
            client,
            history: Mutex::new(VecDeque::new()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Enhance a prompt with an explicit technique
    ///
    /// # Arguments
    /// * `prompt` - The original user input
    /// * `technique` - Technique to apply
    /// * `params` - Template parameters; unset ones use the technique defaults
    /// * `model` - Ollama model, used by `ai_rewrite` only
    pub async fn enhance(
        &self,
        prompt: &str,
        technique: Technique,
        params: &TechniqueParams,
        model: Option<&str>,
    ) -> Result<Enhancement> {
        ensure_not_empty(prompt, EMPTY_ENHANCE_PROMPT)?;

        let enhancement = match render(technique, prompt, params) {
            Some(enhanced_prompt) => Enhancement {
                technique,
                enhanced_prompt,
                critique: None,
            },
            None => {
                let model = self.config.model_or_default(model);
                let (critique, rewritten) = self.rewrite_with_ai(prompt, model).await?;
                Enhancement {
                    technique,
                    enhanced_prompt: rewritten,
                    critique: Some(critique),
                }
            }
        };

        self.record(prompt, &enhancement, params).await;
        info!("Enhanced prompt with {}", technique);
        Ok(enhancement)
    }

    /// Enhance using a technique given by key.
    ///
    /// An unknown key leaves the prompt unchanged and records nothing.
    pub async fn enhance_by_key(
        &self,
        prompt: &str,
        key: &str,
        params: &TechniqueParams,
        model: Option<&str>,
    ) -> Result<Option<Enhancement>> {
        match Technique::from_key(key) {
            Some(technique) => Ok(Some(self.enhance(prompt, technique, params, model).await?)),
            None => {
                warn!("Unknown technique '{}', returning prompt unchanged", key);
                Ok(None)
            }
        }
    }

    /// Choose a technique with the model, then apply it
    pub async fn auto_enhance(&self, prompt: &str, model: Option<&str>) -> Result<Enhancement> {
        ensure_not_empty(prompt, EMPTY_ENHANCE_PROMPT)?;
        let model = self.config.model_or_default(model);

        let technique = self.choose_strategy(prompt, model).await;
        info!("Chosen strategy: {}", technique.name());

        self.enhance(prompt, technique, &TechniqueParams::new(), Some(model))
            .await
    }

    /// Pick the best technique for a prompt.
    ///
    /// Long prompts go straight to `ai_rewrite`. Otherwise the model is asked,
    /// and the first technique key found in its answer wins. Unmatched answers
    /// and model failures fall back to `xml_structure`.
    pub async fn choose_strategy(&self, prompt: &str, model: &str) -> Technique {
        if prompt.split_whitespace().count() > AUTO_REWRITE_WORD_THRESHOLD {
            return Technique::AiRewrite;
        }

        let meta_prompt = strategy_selection_prompt(prompt);
        match ollama::generate(&self.client, &self.config, model, &meta_prompt).await {
            Ok(answer) => match_strategy(&answer),
            Err(e) => {
                warn!("Strategy selection failed, using fallback: {}", e);
                FALLBACK_TECHNIQUE
            }
        }
    }

    /// Critique a prompt with the model, then have it rewrite the prompt.
    ///
    /// Returns `(critique, rewritten_prompt)` with wrapper tags removed.
    pub async fn rewrite_with_ai(&self, prompt: &str, model: &str) -> Result<(String, String)> {
        info!("Requesting critique from {}", model);
        let critique = ollama::generate(&self.client, &self.config, model, &critique_prompt(prompt))
            .await
            .map_err(|e| anyhow!("Critique failed: {}", e))?;

        info!("Requesting rewrite from {}", model);
        let rewritten = ollama::generate(
            &self.client,
            &self.config,
            model,
            &rewrite_prompt(prompt, &critique),
        )
        .await
        .map_err(|e| anyhow!("Rewrite failed: {}", e))?;

        Ok((
            strip_tag(&critique, "critique"),
            strip_tag(&rewritten, "rewritten_prompt"),
        ))
    }

    /// Run a prompt against the model and return its response
    pub async fn generate_response(&self, prompt: &str, model: Option<&str>) -> Result<String> {
        ensure_not_empty(prompt, EMPTY_GENERATE_PROMPT)?;
        let model = self.config.model_or_default(model);
        let response = ollama::generate(&self.client, &self.config, model, prompt).await?;
        Ok(response)
    }

    /// List available models; never fails, reporting `connected: false` instead
    pub async fn list_models(&self) -> ModelListing {
        match ollama::list_models(&self.client, &self.config).await {
            Ok(models) => ModelListing {
                models,
                connected: true,
            },
            Err(e) => {
                warn!("Could not connect to Ollama: {}", e);
                ModelListing {
                    models: Vec::new(),
                    connected: false,
                }
            }
        }
    }

    pub fn analyze(&self, prompt: &str) -> PromptAnalysis {
        analyze_prompt(prompt)
    }

    /// Recorded enhancements, oldest first
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().await.iter().cloned().collect()
    }

    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
    }

    async fn record(&self, original: &str, enhancement: &Enhancement, params: &TechniqueParams) {
        let entry = HistoryEntry {
            timestamp: Local::now().to_rfc3339(),
            original: original.to_string(),
            enhanced: enhancement.enhanced_prompt.clone(),
            technique: enhancement.technique,
            parameters: params.clone(),
        };

        let mut history = self.history.lock().await;
        if history.len() == MAX_HISTORY {
            history.pop_front();
        }
        history.push_back(entry);
    }
}

fn ensure_not_empty(prompt: &str, message: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(anyhow!("{}", message));
    }
    Ok(())
}

/// Map a model's free-form answer to a technique
pub fn match_strategy(answer: &str) -> Technique {
    let answer = answer.trim().to_lowercase();
    Technique::ALL
        .into_iter()
        .find(|t| answer.contains(t.key()))
        .unwrap_or(FALLBACK_TECHNIQUE)
}

/// Remove `<tag>` and `</tag>` wherever they appear, then trim
pub fn strip_tag(text: &str, tag: &str) -> String {
    text.replace(&format!("<{}>", tag), "")
        .replace(&format!("</{}>", tag), "")
        .trim()
        .to_string()
}
