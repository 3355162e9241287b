//! Local prompt analysis
//!
//! Cheap heuristics that score a prompt without calling the model. Every
//! score is on a 0-10 scale.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

const MAX_SCORE: u8 = 10;

/// Prompts shorter than this are flagged as underspecified
const SHORT_PROMPT_WORDS: usize = 5;

/// Sentences longer than this (in words) cost clarity
const LONG_SENTENCE_WORDS: usize = 30;

const VAGUE_WORDS: &[&str] = &[
    "something",
    "stuff",
    "things",
    "thing",
    "etc",
    "maybe",
    "somehow",
    "whatever",
    "some",
    "good",
    "nice",
];

const FORMAT_WORDS: &[&str] = &[
    "format", "json", "list", "table", "bullet", "bullets", "words", "sentences", "paragraph",
    "paragraphs", "markdown", "csv", "yaml", "steps",
];

const CONTEXT_WORDS: &[&str] = &[
    "context",
    "background",
    "because",
    "audience",
    "goal",
    "purpose",
    "for",
    "using",
    "given",
];

static XML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[A-Za-z_][\w-]*>").unwrap());
static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:[-*•]|\d+[.)])\s+\S").unwrap());
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").unwrap());

/// Heuristic report on a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptAnalysis {
    /// Length in characters
    pub length: usize,
    pub word_count: usize,
    pub clarity_score: u8,
    pub structure_score: u8,
    pub specificity_score: u8,
    pub suggestions: Vec<String>,
}

/// Score a prompt and suggest improvements
pub fn analyze_prompt(prompt: &str) -> PromptAnalysis {
    let words: Vec<String> = prompt
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();
    let word_count = words.len();

    let vague: Vec<&str> = VAGUE_WORDS
        .iter()
        .copied()
        .filter(|v| words.iter().any(|w| w.as_str() == *v))
        .collect();
    let has_format = words.iter().any(|w| FORMAT_WORDS.contains(&w.as_str()));
    let has_context = words.iter().any(|w| CONTEXT_WORDS.contains(&w.as_str()));
    let has_tags = XML_TAG_RE.is_match(prompt);
    let has_list = LIST_ITEM_RE.is_match(prompt);
    let has_paragraphs = prompt.trim().contains('\n');

    let clarity_score = clarity(prompt, word_count, vague.len());

    let mut structure: usize = 2;
    if has_tags {
        structure += 4;
    }
    if has_list {
        structure += 2;
    }
    if has_paragraphs {
        structure += 2;
    }
    let structure_score = clamp(structure);

    let mut specificity = (word_count / 5).min(5);
    if NUMBER_RE.is_match(prompt) {
        specificity += 1;
    }
    if prompt.contains('"') || prompt.contains('`') {
        specificity += 1;
    }
    if has_format {
        specificity += 2;
    }
    if has_context {
        specificity += 1;
    }
    let specificity_score = clamp(specificity);

    let mut suggestions = Vec::new();
    if word_count < SHORT_PROMPT_WORDS {
        suggestions.push(
            "Expand the prompt: describe the task, the expected result, and any constraints."
                .to_string(),
        );
    }
    if !vague.is_empty() {
        suggestions.push(format!(
            "Replace vague words ({}) with concrete requirements.",
            vague.join(", ")
        ));
    }
    if !has_context {
        suggestions.push("Add background context: who the output is for and why.".to_string());
    }
    if !has_format {
        suggestions.push(
            "Specify the desired output format (for example a list, table, JSON, or length)."
                .to_string(),
        );
    }
    if structure_score < 5 {
        suggestions.push(
            "Organize the prompt into sections with XML tags such as <instructions> and <context>."
                .to_string(),
        );
    }

    PromptAnalysis {
        length: prompt.chars().count(),
        word_count,
        clarity_score,
        structure_score,
        specificity_score,
        suggestions,
    }
}

fn clarity(prompt: &str, word_count: usize, vague_count: usize) -> u8 {
    if word_count == 0 {
        return 0;
    }

    let mut penalty = vague_count * 2;
    if word_count < SHORT_PROMPT_WORDS {
        penalty += 3;
    }

    let longest_sentence = prompt
        .split(['.', '!', '?', '\n'])
        .map(|s| s.split_whitespace().count())
        .max()
        .unwrap_or(0);
    if longest_sentence > LONG_SENTENCE_WORDS {
        penalty += 1;
    }

    clamp((MAX_SCORE as usize).saturating_sub(penalty))
}

fn clamp(score: usize) -> u8 {
    score.min(MAX_SCORE as usize) as u8
}
