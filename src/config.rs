//! Configuration module - CLI arguments and settings

use anyhow::{anyhow, Result};
use std::sync::Arc;

/// Environment variable Ollama itself uses for its listen address
pub const ENV_OLLAMA_HOST: &str = "OLLAMA_HOST";

/// Environment variable for the default model
pub const ENV_ENHANCER_MODEL: &str = "PROMPT_ENHANCER_MODEL";

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3";

/// Port Ollama listens on when `OLLAMA_HOST` names no port
pub const OLLAMA_DEFAULT_PORT: u16 = 11434;

/// Host used when `OLLAMA_HOST` gives only a port (`:11434`)
const OLLAMA_DEFAULT_HOST: &str = "127.0.0.1";

/// Default Web UI port
pub const DEFAULT_UI_PORT: u16 = 8501;

/// Optional configuration parameters for Config::new()
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub ollama_url: Option<String>,
    pub default_model: Option<String>,
    pub generate_timeout: Option<u64>,
    pub models_timeout: Option<u64>,
    pub ui_port: Option<u16>,
    pub no_browser: bool,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub ollama_url: String,
    pub default_model: String,
    pub generate_timeout_secs: u64,
    pub models_timeout_secs: u64,
    pub ui_port: u16,
    pub no_browser: bool,
}

impl Config {
    /// Create a new Config; unset options fall back to the environment, then defaults
    pub fn new(options: ConfigOptions) -> Result<Arc<Self>> {
        let ollama_url = options
            .ollama_url
            .or_else(|| env_non_empty(ENV_OLLAMA_HOST))
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        let ollama_url = normalize_base_url(&ollama_url)?;

        let default_model = options
            .default_model
            .or_else(|| env_non_empty(ENV_ENHANCER_MODEL))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let default_model = default_model.trim().to_string();
        if default_model.is_empty() {
            return Err(anyhow!("model name cannot be empty"));
        }

        Ok(Arc::new(Self {
            ollama_url,
            default_model,
            generate_timeout_secs: options.generate_timeout.unwrap_or(90),
            models_timeout_secs: options.models_timeout.unwrap_or(10),
            ui_port: options.ui_port.unwrap_or(DEFAULT_UI_PORT),
            no_browser: options.no_browser,
        }))
    }

    /// Config pointing at an explicit Ollama URL, ignoring the environment
    pub fn with_ollama_url(url: &str) -> Result<Arc<Self>> {
        Self::new(ConfigOptions {
            ollama_url: Some(url.to_string()),
            default_model: Some(DEFAULT_MODEL.to_string()),
            ..Default::default()
        })
    }

    /// Pick the request model, falling back to the configured default
    pub fn model_or_default<'a>(&'a self, model: Option<&'a str>) -> &'a str {
        match model.map(str::trim) {
            Some(m) if !m.is_empty() => m,
            _ => &self.default_model,
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalize a server address into a base URL.
///
/// Follows Ollama's own reading of `OLLAMA_HOST`: a value without a scheme
/// gets `http://`, an empty host becomes `127.0.0.1` and a missing port
/// becomes 11434 (`0.0.0.0` -> `http://0.0.0.0:11434`). A value with an
/// explicit scheme keeps that scheme's default port. Trailing slashes are
/// removed.
pub fn normalize_base_url(url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(anyhow!("ollama_url cannot be empty"));
    }

    let (scheme, rest, explicit_scheme) = match url.split_once("://") {
        Some((scheme, rest)) => (scheme.to_lowercase(), rest, true),
        None => ("http".to_string(), url, false),
    };
    if scheme != "http" && scheme != "https" {
        return Err(anyhow!("unsupported ollama_url scheme: {}", scheme));
    }

    let (hostport, path) = match rest.split_once('/') {
        Some((hostport, path)) => (hostport, path.trim_end_matches('/')),
        None => (rest, ""),
    };

    let (host, port) = split_host_port(hostport)?;
    if host.is_empty() && explicit_scheme {
        return Err(anyhow!("ollama_url cannot be empty"));
    }
    let host = if host.is_empty() {
        OLLAMA_DEFAULT_HOST
    } else {
        host
    };

    let mut base = match (port, explicit_scheme) {
        (Some(port), _) => format!("{}://{}:{}", scheme, host, port),
        (None, true) => format!("{}://{}", scheme, host),
        (None, false) => format!("{}://{}:{}", scheme, host, OLLAMA_DEFAULT_PORT),
    };
    if !path.is_empty() {
        base.push('/');
        base.push_str(path);
    }

    Ok(base)
}

/// Split `host[:port]`, keeping bracketed IPv6 hosts intact
fn split_host_port(hostport: &str) -> Result<(&str, Option<&str>)> {
    if hostport.starts_with('[') {
        if let Some(end) = hostport.find(']') {
            let port = hostport[end + 1..]
                .strip_prefix(':')
                .filter(|p| !p.is_empty());
            return Ok((&hostport[..=end], port));
        }
    }

    match hostport.rsplit_once(':') {
        // A bare IPv6 address has several colons and no port
        Some((host, _)) if host.contains(':') => Ok((hostport, None)),
        Some((host, port)) => {
            if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
                return Err(anyhow!("invalid port in ollama_url: {}", hostport));
            }
            Ok((host, Some(port)))
        }
        None => Ok((hostport, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_scheme() {
        assert_eq!(
            normalize_base_url("127.0.0.1:11434").unwrap(),
            "http://127.0.0.1:11434"
        );
    }

    #[test]
    fn test_normalize_keeps_https() {
        assert_eq!(
            normalize_base_url("https://ollama.internal/").unwrap(),
            "https://ollama.internal"
        );
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(normalize_base_url("   ").is_err());
        assert!(normalize_base_url("http://").is_err());
    }

    #[test]
    fn test_normalize_host_without_port_gets_ollama_port() {
        assert_eq!(
            normalize_base_url("0.0.0.0").unwrap(),
            "http://0.0.0.0:11434"
        );
        assert_eq!(
            normalize_base_url("127.0.0.1").unwrap(),
            "http://127.0.0.1:11434"
        );
        assert_eq!(
            normalize_base_url("gpu-box/").unwrap(),
            "http://gpu-box:11434"
        );
    }

    #[test]
    fn test_normalize_port_only_uses_loopback() {
        assert_eq!(
            normalize_base_url(":11434").unwrap(),
            "http://127.0.0.1:11434"
        );
        assert_eq!(normalize_base_url(":8080").unwrap(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_normalize_explicit_scheme_keeps_default_port() {
        assert_eq!(normalize_base_url("https://host").unwrap(), "https://host");
        assert_eq!(
            normalize_base_url("http://localhost:11434").unwrap(),
            "http://localhost:11434"
        );
    }

    #[test]
    fn test_normalize_ipv6() {
        assert_eq!(normalize_base_url("[::1]").unwrap(), "http://[::1]:11434");
        assert_eq!(
            normalize_base_url("[::1]:9999").unwrap(),
            "http://[::1]:9999"
        );
    }

    #[test]
    fn test_normalize_rejects_bad_input() {
        assert!(normalize_base_url("host:abc").is_err());
        assert!(normalize_base_url("ftp://host").is_err());
    }

    #[test]
    fn test_model_or_default() {
        let config = Config::with_ollama_url("http://localhost:11434").unwrap();
        assert_eq!(config.model_or_default(None), "llama3");
        assert_eq!(config.model_or_default(Some("  ")), "llama3");
        assert_eq!(config.model_or_default(Some("mistral")), "mistral");
    }
}
