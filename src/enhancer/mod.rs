//! Prompt Enhancer module
//! Rewrites user prompts with structured techniques and a local Ollama model

mod analysis;
mod prompt_enhancer;
mod server;
pub mod techniques;
pub mod templates;

pub use analysis::{analyze_prompt, PromptAnalysis};
pub use prompt_enhancer::{
    match_strategy, strip_tag, Enhancement, HistoryEntry, ModelListing, PromptEnhancer,
    AUTO_REWRITE_WORD_THRESHOLD, FALLBACK_TECHNIQUE, MAX_HISTORY,
};
pub use server::EnhancerServer;
pub use techniques::{parse_param, render, Technique, TechniqueParams};
pub use templates::ENHANCER_UI_HTML;
