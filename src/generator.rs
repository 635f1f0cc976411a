//! Answer generator abstraction and remote implementations.
//!
//! Defines the [`Generator`] trait and the remote backends that turn a
//! question plus assembled context into prose:
//! - **[`OpenAiGenerator`]** — calls the OpenAI chat completions API.
//! - **[`AnthropicGenerator`]** — calls the Anthropic messages API.
//!
//! Providers are selected once at construction from `[generator]`
//! config, never probed at runtime. The `"rule-based"` provider maps to
//! no remote generator at all — the chat pipeline answers with the
//! rule-based formatter instead, which is also where every remote
//! failure lands after retries are exhausted.
//!
//! # Retry Strategy
//!
//! Both remote backends use exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::GeneratorConfig;

const OPENAI_DEFAULT_MODEL: &str = "gpt-4";
const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-opus-20240229";
const ANTHROPIC_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = "You are a Game of Thrones expert chatbot.";

/// Trait for remote answer generators.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable provider label (e.g. `"OpenAI"`).
    fn provider(&self) -> &str;
    /// Model identifier sent to the API.
    fn model(&self) -> &str;
    /// Generate an answer to `question` grounded in `context`.
    async fn generate(&self, question: &str, context: &str) -> Result<String>;
}

/// Create the configured remote generator, or `None` for the
/// rule-based provider.
///
/// # Errors
///
/// Returns an error for an unknown provider name or a missing API key
/// environment variable.
pub fn create_generator(config: &GeneratorConfig) -> Result<Option<Box<dyn Generator>>> {
    match config.provider.as_str() {
        "rule-based" => Ok(None),
        "openai" => Ok(Some(Box::new(OpenAiGenerator::new(config)?))),
        "anthropic" => Ok(Some(Box::new(AnthropicGenerator::new(config)?))),
        other => bail!("Unknown generator provider: {}", other),
    }
}

/// Prompt shared by both remote providers: the model must answer only
/// from the supplied wiki context and admit what it does not know.
fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a Game of Thrones expert chatbot with access to a specific dataset of Game of Thrones information.\n\
         \n\
         EXTREMELY IMPORTANT: You must ONLY use the information provided below. Do NOT use any external knowledge \
         or make up details not explicitly mentioned in the provided context. If the information needed to answer \
         the question is not in the provided context, clearly state that you don't have that specific information \
         in your dataset.\n\
         \n\
         Game of Thrones Wiki Information:\n\
         {context}\n\
         \n\
         User Question: {question}\n\
         \n\
         RESPONSE REQUIREMENTS:\n\
         1. ONLY use information explicitly provided in the context above\n\
         2. If the exact answer is not in the context, say: \"Based on the information I have, I don't know [specific detail].\" Do NOT guess or make up information.\n\
         3. Use direct quotes or paraphrase directly from the context whenever possible\n\
         4. Keep your tone friendly and conversational, like a fan discussing the show\n\
         5. Use 2-3 concise paragraphs at most\n\
         6. Focus exclusively on answering what was asked, using only the context provided"
    )
}

// ============ OpenAI ============

/// Generator using the OpenAI chat completions API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiGenerator {
    model: String,
    config: GeneratorConfig,
}

impl OpenAiGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        if std::env::var("OPENAI_API_KEY").is_err() {
            bail!("OPENAI_API_KEY environment variable not set");
        }
        Ok(Self {
            model: config
                .model
                .clone()
                .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string()),
            config: config.clone(),
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn provider(&self) -> &str {
        "OpenAI"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(question, context)}
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        let json = post_with_retry(
            &self.config,
            "https://api.openai.com/v1/chat/completions",
            &[("Authorization", format!("Bearer {api_key}"))],
            &body,
            "OpenAI",
        )
        .await?;

        json.pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing message content"))
    }
}

// ============ Anthropic ============

/// Generator using the Anthropic messages API.
///
/// Requires the `ANTHROPIC_API_KEY` environment variable.
pub struct AnthropicGenerator {
    model: String,
    config: GeneratorConfig,
}

impl AnthropicGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        if std::env::var("ANTHROPIC_API_KEY").is_err() {
            bail!("ANTHROPIC_API_KEY environment variable not set");
        }
        Ok(Self {
            model: config
                .model
                .clone()
                .unwrap_or_else(|| ANTHROPIC_DEFAULT_MODEL.to_string()),
            config: config.clone(),
        })
    }
}

#[async_trait]
impl Generator for AnthropicGenerator {
    fn provider(&self) -> &str {
        "Anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow::anyhow!("ANTHROPIC_API_KEY not set"))?;

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": SYSTEM_PROMPT,
            "messages": [
                {"role": "user", "content": build_prompt(question, context)}
            ],
        });

        let json = post_with_retry(
            &self.config,
            "https://api.anthropic.com/v1/messages",
            &[
                ("x-api-key", api_key),
                ("anthropic-version", ANTHROPIC_VERSION.to_string()),
            ],
            &body,
            "Anthropic",
        )
        .await?;

        json.pointer("/content/0/text")
            .and_then(|c| c.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("Invalid Anthropic response: missing content text"))
    }
}

// ============ Shared HTTP plumbing ============

/// POST a JSON body with exponential-backoff retry on transient errors.
async fn post_with_retry(
    config: &GeneratorConfig,
    url: &str,
    headers: &[(&str, String)],
    body: &serde_json::Value,
    label: &str,
) -> Result<serde_json::Value> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let mut last_err = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let mut req = client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);
        for (name, value) in headers {
            req = req.header(*name, value.as_str());
        }

        match req.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return Ok(response.json().await?);
                }

                // Rate limited or server error — retry
                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(anyhow::anyhow!("{} API error {}: {}", label, status, body_text));
                    continue;
                }

                // Client error (not 429) — don't retry
                let body_text = response.text().await.unwrap_or_default();
                bail!("{} API error {}: {}", label, status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{} request failed after retries", label)))
}
