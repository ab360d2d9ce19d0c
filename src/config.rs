use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::chunk::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub chat: ChatConfig,
    pub server: ServerConfig,
}

/// Where the corpus text comes from. Exactly one of `url` / `file` is set.
#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Website to fetch and extract text from.
    #[serde(default)]
    pub url: Option<String>,
    /// Plain-text file to read instead of fetching (offline runs, tests).
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default = "default_corpus_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_corpus_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_overlap() -> usize {
    DEFAULT_OVERLAP
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `openai` or `ollama`.
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    pub model: Option<String>,
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider (default `http://localhost:11434`).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// `openai` or `ollama`.
    #[serde(default = "default_chat_provider")]
    pub provider: String,
    pub model: Option<String>,
    /// Base URL for the Ollama provider (default `http://localhost:11434`).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_chat_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_chat_provider() -> String {
    "openai".to_string()
}
fn default_chat_max_retries() -> u32 {
    2
}
fn default_chat_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate corpus source
    match (&config.corpus.url, &config.corpus.file) {
        (None, None) => anyhow::bail!("corpus source is unset: set corpus.url or corpus.file"),
        (Some(_), Some(_)) => {
            anyhow::bail!("corpus.url and corpus.file are mutually exclusive; set exactly one")
        }
        (Some(url), None) if url.trim().is_empty() => {
            anyhow::bail!("corpus.url must not be empty")
        }
        _ => {}
    }

    // Validate chunking
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.overlap >= config.chunking.chunk_size {
        anyhow::bail!(
            "chunking.overlap ({}) must be smaller than chunking.chunk_size ({})",
            config.chunking.overlap,
            config.chunking.chunk_size
        );
    }

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be openai or ollama.",
            other
        ),
    }
    if config.embedding.model.is_none() {
        anyhow::bail!(
            "embedding.model must be specified for provider '{}'",
            config.embedding.provider
        );
    }
    if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
        anyhow::bail!(
            "embedding.dims must be > 0 for provider '{}'",
            config.embedding.provider
        );
    }

    // Validate chat
    match config.chat.provider.as_str() {
        "openai" | "ollama" => {}
        other => anyhow::bail!("Unknown chat provider: '{}'. Must be openai or ollama.", other),
    }
    if config.chat.model.is_none() {
        anyhow::bail!(
            "chat.model must be specified for provider '{}'",
            config.chat.provider
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    const VALID: &str = r#"
[corpus]
url = "https://example.com/"

[embedding]
model = "text-embedding-3-small"
dims = 1536

[chat]
model = "gpt-4o-mini"

[server]
bind = "127.0.0.1:8080"
"#;

    #[test]
    fn test_valid_config_with_defaults() {
        let f = write_config(VALID);
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.chunking.chunk_size, 500);
        assert_eq!(cfg.chunking.overlap, 50);
        assert_eq!(cfg.retrieval.top_k, 3);
        assert_eq!(cfg.embedding.provider, "openai");
        assert_eq!(cfg.embedding.batch_size, 64);
        assert_eq!(cfg.chat.provider, "openai");
    }

    #[test]
    fn test_missing_corpus_source_rejected() {
        let f = write_config(&VALID.replace("url = \"https://example.com/\"", ""));
        let err = load_config(f.path()).unwrap_err();
        assert!(err.to_string().contains("corpus source is unset"));
    }

    #[test]
    fn test_both_corpus_sources_rejected() {
        let f = write_config(&VALID.replace(
            "url = \"https://example.com/\"",
            "url = \"https://example.com/\"\nfile = \"corpus.txt\"",
        ));
        let err = load_config(f.path()).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_overlap_ge_chunk_size_rejected() {
        let f = write_config(&format!("{}\n[chunking]\nchunk_size = 100\noverlap = 100\n", VALID));
        let err = load_config(f.path()).unwrap_err();
        assert!(err.to_string().contains("must be smaller"));
    }

    #[test]
    fn test_unknown_embedding_provider_rejected() {
        let f = write_config(&VALID.replace(
            "model = \"text-embedding-3-small\"",
            "provider = \"cohere\"\nmodel = \"embed-v3\"",
        ));
        let err = load_config(f.path()).unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_missing_dims_rejected() {
        let f = write_config(&VALID.replace("dims = 1536", ""));
        let err = load_config(f.path()).unwrap_err();
        assert!(err.to_string().contains("embedding.dims"));
    }
}
