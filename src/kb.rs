//! The knowledge base: chunks, index, and embedder in one immutable value.
//!
//! Built once at startup and shared read-only across every request handler,
//! so there is no global state and no locking on the query path. Bundling
//! the chunk list with the index also makes id misalignment impossible:
//! `search` results can only ever be resolved against the chunk list the
//! index was built from.

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::chunk::chunk_text;
use crate::config::{ChunkingConfig, Config};
use crate::corpus;
use crate::embedding::{create_embedder, Embedder};
use crate::index::VectorIndex;
use crate::models::Chunk;

pub struct KnowledgeBase {
    chunks: Vec<Chunk>,
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("chunks", &self.chunks.len())
            .field("embedder", &self.embedder.model_name())
            .finish()
    }
}

impl KnowledgeBase {
    /// Chunk the corpus, embed every chunk, and build the index.
    ///
    /// Embedding runs in batches of `batch_size` texts per provider call.
    ///
    /// # Errors
    ///
    /// Fails when the corpus produced zero chunks, when the embedding
    /// provider is unreachable or returns malformed vectors, or when the
    /// chunking parameters are invalid. All of these are fatal at startup —
    /// the service must not answer questions without a grounded index.
    pub async fn build(
        corpus_text: &str,
        chunking: &ChunkingConfig,
        batch_size: usize,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let chunks = chunk_text(corpus_text, chunking.chunk_size, chunking.overlap)?;
        if chunks.is_empty() {
            bail!("corpus is empty: nothing to index");
        }

        let batch_size = batch_size.max(1);
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let mut batch_vectors = embedder.embed_batch(&texts).await?;
            vectors.append(&mut batch_vectors);
        }

        let index = VectorIndex::build(vectors)?;

        Ok(Self {
            chunks,
            index,
            embedder,
        })
    }

    /// Load the corpus and build the knowledge base from configuration.
    ///
    /// This is the one-time startup sequence; it must complete before the
    /// service accepts requests.
    pub async fn bootstrap(config: &Config) -> Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let raw = corpus::load_corpus(&config.corpus).await?;
        if raw.trim().is_empty() {
            bail!("corpus is empty: the source produced no text");
        }
        Self::build(
            &raw,
            &config.chunking,
            config.embedding.batch_size,
            embedder,
        )
        .await
    }

    /// Embed `query` and return the `top_k` nearest chunk texts, closest
    /// first.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        let query_vec = self.embedder.embed(query).await?;
        let hits = self.index.search(&query_vec, top_k)?;
        Ok(hits
            .iter()
            .map(|hit| self.chunks[hit.chunk_id].text.clone())
            .collect())
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn dims(&self) -> usize {
        self.index.dims()
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }
}
