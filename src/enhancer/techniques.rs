//! Enhancement techniques and template rendering

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::{anyhow, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::templates::{
    CHAIN_OF_THOUGHT_TEMPLATE, MULTISHOT_EXAMPLES_TEMPLATE, ROLE_PROMPTING_TEMPLATE,
    XML_STRUCTURE_TEMPLATE,
};

/// Placeholder every template carries for the user's prompt
pub const ORIGINAL_PROMPT_KEY: &str = "original_prompt";

/// Enhancement technique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    /// Critique with the model, then have it rewrite the prompt
    AiRewrite,
    XmlStructure,
    ChainOfThought,
    RolePrompting,
    MultishotExamples,
}

impl Technique {
    /// All techniques in canonical order; strategy matching walks this order
    pub const ALL: [Technique; 5] = [
        Technique::AiRewrite,
        Technique::XmlStructure,
        Technique::ChainOfThought,
        Technique::RolePrompting,
        Technique::MultishotExamples,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::AiRewrite => "ai_rewrite",
            Self::XmlStructure => "xml_structure",
            Self::ChainOfThought => "chain_of_thought",
            Self::RolePrompting => "role_prompting",
            Self::MultishotExamples => "multishot_examples",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AiRewrite => "AI-Driven Rewrite",
            Self::XmlStructure => "XML Structure Enhancement",
            Self::ChainOfThought => "Chain of Thought with XML",
            Self::RolePrompting => "Role-Based Prompting",
            Self::MultishotExamples => "Multishot Example Enhancement",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::AiRewrite => {
                "Uses an AI to critique and rewrite the prompt from scratch for maximum effectiveness."
            }
            Self::XmlStructure => {
                "Uses XML tags for clear prompt organization (Anthropic's signature technique)"
            }
            Self::ChainOfThought => "Encourages step-by-step reasoning with structured thinking",
            Self::RolePrompting => "Assigns specific expert roles for domain expertise",
            Self::MultishotExamples => {
                "Provides multiple high-quality examples with consistent formatting"
            }
        }
    }

    /// Static template, or None for model-driven techniques
    pub fn template(&self) -> Option<&'static str> {
        match self {
            Self::AiRewrite => None,
            Self::XmlStructure => Some(XML_STRUCTURE_TEMPLATE),
            Self::ChainOfThought => Some(CHAIN_OF_THOUGHT_TEMPLATE),
            Self::RolePrompting => Some(ROLE_PROMPTING_TEMPLATE),
            Self::MultishotExamples => Some(MULTISHOT_EXAMPLES_TEMPLATE),
        }
    }

    /// Parameter defaults used when the caller leaves a placeholder unset
    pub fn default_params(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::RolePrompting => &[
                ("persona", "subject-matter expert"),
                ("years_experience", "20"),
                ("domain", "the field this task belongs to"),
                ("key_strengths", "clear thinking and practical judgement"),
                ("reputation_traits", "accurate, well-structured answers"),
            ],
            Self::MultishotExamples => &[
                ("example_input_1", "A representative input for this task"),
                ("example_output_1", "The ideal output for that input"),
                ("example_input_2", "A second, contrasting input"),
                ("example_output_2", "The ideal output for the second input"),
            ],
            _ => &[],
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL.into_iter().find(|t| t.key() == key)
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Technique {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_key(s).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(|t| t.key()).collect();
            anyhow!(
                "Unknown technique '{}', expected one of: {}",
                s.trim(),
                known.join(", ")
            )
        })
    }
}

/// Named template parameters supplied by the caller
pub type TechniqueParams = BTreeMap<String, String>;

/// Parse a `key=value` pair as given on the command line
pub fn parse_param(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid parameter '{}', expected key=value", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("Invalid parameter '{}', key is empty", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_][a-z0-9_]*)\}").unwrap());

/// Fill a technique's template with the prompt and parameters.
///
/// Substitution is a single pass over the template, so braces inside the
/// prompt or parameter values are never treated as placeholders. Explicit
/// parameters win over defaults; placeholders with no value stay verbatim.
pub fn render(technique: Technique, prompt: &str, params: &TechniqueParams) -> Option<String> {
    let template = technique.template()?;
    let defaults = technique.default_params();

    let rendered = PLACEHOLDER_RE.replace_all(template, |caps: &Captures| {
        let key = &caps[1];
        if key == ORIGINAL_PROMPT_KEY {
            return prompt.to_string();
        }
        if let Some(value) = params.get(key) {
            return value.clone();
        }
        defaults
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });

    Some(rendered.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip() {
        for technique in Technique::ALL {
            assert_eq!(Technique::from_key(technique.key()), Some(technique));
            assert_eq!(technique.to_string(), technique.key());
        }
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "magic".parse::<Technique>().unwrap_err();
        assert!(err.to_string().contains("xml_structure"));
    }

    #[test]
    fn test_only_ai_rewrite_lacks_template() {
        for technique in Technique::ALL {
            assert_eq!(
                technique.template().is_none(),
                technique == Technique::AiRewrite
            );
        }
    }

    #[test]
    fn test_serde_uses_keys() {
        let json = serde_json::to_string(&Technique::ChainOfThought).unwrap();
        assert_eq!(json, "\"chain_of_thought\"");
        let t: Technique = serde_json::from_str("\"role_prompting\"").unwrap();
        assert_eq!(t, Technique::RolePrompting);
    }

    #[test]
    fn test_render_xml_structure() {
        let out = render(Technique::XmlStructure, "test prompt", &TechniqueParams::new()).unwrap();
        assert!(out.starts_with("<instructions>\ntest prompt\n</instructions>"));
        assert!(out.contains("<formatting>"));
    }

    #[test]
    fn test_render_does_not_expand_braces_in_prompt() {
        let prompt = "Format as {persona} and {original_prompt}";
        let out = render(Technique::RolePrompting, prompt, &TechniqueParams::new()).unwrap();
        assert!(out.contains(prompt));
        assert!(out.contains("You are a world-class subject-matter expert"));
    }

    #[test]
    fn test_render_params_override_defaults() {
        let mut params = TechniqueParams::new();
        params.insert("persona".to_string(), "tax accountant".to_string());
        params.insert("years_experience".to_string(), "15".to_string());
        let out = render(Technique::RolePrompting, "Review my return", &params).unwrap();
        assert!(out.contains("world-class tax accountant with 15 years"));
        assert!(out.contains("As an expert tax accountant"));
    }

    #[test]
    fn test_render_multishot_defaults_fill_every_slot() {
        let out = render(Technique::MultishotExamples, "Classify", &TechniqueParams::new()).unwrap();
        assert!(!out.contains("{example_"));
    }

    #[test]
    fn test_render_ai_rewrite_is_none() {
        assert!(render(Technique::AiRewrite, "x", &TechniqueParams::new()).is_none());
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("persona=data engineer").unwrap(),
            ("persona".to_string(), "data engineer".to_string())
        );
        assert_eq!(parse_param("k=a=b").unwrap().1, "a=b");
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }
}
