use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Maximum documents drawn into one context.
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,
    /// Hard cap on assembled context length, in characters.
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    /// Context radius around a query match when excerpting.
    #[serde(default = "default_excerpt_context_chars")]
    pub excerpt_context_chars: usize,
    /// Result cap for the standalone `lore search` command.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_documents: default_max_documents(),
            max_context_chars: default_max_context_chars(),
            excerpt_context_chars: default_excerpt_context_chars(),
            search_limit: default_search_limit(),
        }
    }
}

fn default_max_documents() -> usize {
    5
}
fn default_max_context_chars() -> usize {
    4000
}
fn default_excerpt_context_chars() -> usize {
    150
}
fn default_search_limit() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneratorConfig {
    /// `"rule-based"`, `"openai"`, or `"anthropic"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model name for remote providers.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GeneratorConfig {
    pub fn is_remote(&self) -> bool {
        self.provider != "rule-based"
    }
}

fn default_provider() -> String {
    "rule-based".to_string()
}
fn default_max_tokens() -> u32 {
    500
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.txt".to_string()]
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate retrieval
    if config.retrieval.max_documents == 0 {
        anyhow::bail!("retrieval.max_documents must be >= 1");
    }
    if config.retrieval.max_context_chars == 0 {
        anyhow::bail!("retrieval.max_context_chars must be > 0");
    }
    if config.retrieval.excerpt_context_chars == 0 {
        anyhow::bail!("retrieval.excerpt_context_chars must be > 0");
    }

    // Validate generator
    match config.generator.provider.as_str() {
        "rule-based" | "openai" | "anthropic" => {}
        other => anyhow::bail!(
            "Unknown generator provider: '{}'. Must be rule-based, openai, or anthropic.",
            other
        ),
    }

    if !(0.0..=2.0).contains(&config.generator.temperature) {
        anyhow::bail!("generator.temperature must be in [0.0, 2.0]");
    }

    Ok(config)
}
