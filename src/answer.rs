//! Grounded answer composition.
//!
//! Defines the [`ChatCompleter`] capability and two adapters:
//! - **[`OpenAiChat`]** — `POST /v1/chat/completions` with a fixed system
//!   persona and the grounding prompt as the user message.
//! - **[`OllamaChat`]** — `POST {url}/api/chat` (non-streaming) against a
//!   local Ollama instance.
//!
//! The grounding prompt joins the retrieved chunk texts with blank lines and
//! appends the literal question, instructing the model to prefer the
//! supplied context and fall back to general knowledge when it is
//! insufficient. An empty completion is an error, never an empty answer.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ChatConfig;

/// System framing sent with every completion request.
const SYSTEM_PROMPT: &str = "You are this website's assistant. You answer visitor questions \
     concisely and conversationally, grounded in the site content you are given.";

/// Capability interface for chat-completion backends.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;

    /// Produce one completion for `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Create the appropriate [`ChatCompleter`] based on configuration.
pub fn create_completer(config: &ChatConfig) -> Result<Arc<dyn ChatCompleter>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiChat::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaChat::new(config)?)),
        other => bail!("Unknown chat provider: {}", other),
    }
}

/// Build the grounding prompt from retrieved chunk texts and the question.
///
/// Chunks are separated by blank lines so sentences from unrelated parts of
/// the corpus never run together.
pub fn build_prompt(query: &str, context: &[String]) -> String {
    format!(
        "Answer the following question. If the provided info contains the answer, use it. \
         If the info is insufficient, answer based on your general knowledge.\n\n\
         Info:\n{}\n\nQ: {}",
        context.join("\n\n"),
        query
    )
}

/// Compose the grounding prompt and delegate to the completer.
pub async fn answer(
    completer: &dyn ChatCompleter,
    query: &str,
    context: &[String],
) -> Result<String> {
    let prompt = build_prompt(query, context);
    completer.complete(&prompt).await
}

fn require_model(config: &ChatConfig) -> Result<String> {
    config
        .model
        .clone()
        .ok_or_else(|| anyhow::anyhow!("chat.model required for '{}' provider", config.provider))
}

// ============ OpenAI ============

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Chat adapter for the OpenAI API.
///
/// Requires the `OPENAI_API_KEY` environment variable to be set. Retries
/// 429/5xx/network errors with exponential backoff; other client errors and
/// empty completions fail immediately.
pub struct OpenAiChat {
    model: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAiChat {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let model = require_model(config)?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            api_key,
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl ChatCompleter for OpenAiChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = OpenAiRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post("https://api.openai.com/v1/chat/completions")
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let parsed: OpenAiResponse = response.json().await?;
                        return extract_openai_answer(parsed);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "OpenAI API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("OpenAI API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Chat completion failed after retries")))
    }
}

fn extract_openai_answer(parsed: OpenAiResponse) -> Result<String> {
    let answer = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    if answer.trim().is_empty() {
        bail!("chat completion returned an empty answer");
    }
    Ok(answer)
}

// ============ Ollama ============

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

/// Chat adapter for a local Ollama instance.
pub struct OllamaChat {
    model: String,
    url: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaChat {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let model = require_model(config)?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            url,
            max_retries: config.max_retries,
            client,
        })
    }
}

#[async_trait]
impl ChatCompleter for OllamaChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = OllamaRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
        };

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(format!("{}/api/chat", self.url))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let parsed: OllamaResponse = response.json().await?;
                        if parsed.message.content.trim().is_empty() {
                            bail!("chat completion returned an empty answer");
                        }
                        return Ok(parsed.message.content);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "Ollama API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Ollama API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(anyhow::anyhow!(
                        "Ollama connection error (is Ollama running at {}?): {}",
                        self.url,
                        e
                    ));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Ollama completion failed after retries")))
    }
}
