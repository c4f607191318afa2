//! Retrieval collaborator used by the SQL generator.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use sqlrag_core::config::RetrievalConfig;
use sqlrag_core::SqlRagError;
use sqlrag_storage::Database;

use crate::chunker::TextChunker;
use crate::embedding::{EmbeddingService, HashingEmbedding};
use crate::index::{SearchHit, VectorIndex};
use crate::knowledge;

/// Returns the passages most relevant to a query.
///
/// Implementations never fail: passages are joined with blank lines, and
/// any internal error yields an empty string.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> String;
}

/// Retriever over an in-memory vector index.
#[derive(Debug, Clone)]
pub struct VectorRetriever<E = HashingEmbedding> {
    embedder: E,
    index: VectorIndex,
}

impl<E: EmbeddingService> VectorRetriever<E> {
    /// Create a retriever with an empty index.
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            index: VectorIndex::new(),
        }
    }

    /// Chunk `text`, embed every chunk, and add it to the index.
    ///
    /// Returns the number of chunks indexed.
    pub async fn add_text(&self, text: &str, chunker: &TextChunker) -> Result<usize, SqlRagError> {
        let chunks = chunker.split(text);
        for (i, chunk) in chunks.iter().enumerate() {
            let embedding = self.embedder.embed(chunk).await?;
            self.index.insert(
                Uuid::new_v4(),
                embedding,
                chunk.as_str(),
                serde_json::json!({ "chunk": i }),
            )?;
        }
        debug!(chunks = chunks.len(), "Indexed knowledge-base chunks");
        Ok(chunks.len())
    }

    /// Build a retriever over `text`.
    pub async fn from_text(
        embedder: E,
        text: &str,
        chunker: &TextChunker,
    ) -> Result<Self, SqlRagError> {
        let retriever = Self::new(embedder);
        retriever.add_text(text, chunker).await?;
        Ok(retriever)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, SqlRagError> {
        let embedding = self.embedder.embed(query).await?;
        self.index.search(&embedding, k)
    }
}

#[async_trait]
impl<E: EmbeddingService> Retriever for VectorRetriever<E> {
    async fn retrieve(&self, query: &str, k: usize) -> String {
        match self.search(query, k).await {
            Ok(hits) if hits.is_empty() => {
                warn!("Retrieval returned no passages");
                String::new()
            }
            Ok(hits) => hits
                .into_iter()
                .map(|h| h.text)
                .collect::<Vec<_>>()
                .join("\n\n"),
            Err(e) => {
                warn!(error = %e, "Retrieval failed, continuing without context");
                String::new()
            }
        }
    }
}

/// Load (or build and cache) the knowledge base and index it.
pub async fn build_retriever(
    config: &RetrievalConfig,
    db: &Database,
) -> Result<VectorRetriever<HashingEmbedding>, SqlRagError> {
    let text = knowledge::load_or_build(Path::new(&config.knowledge_base_path), db)?;
    let chunker = TextChunker::new(config.chunk_size, config.chunk_overlap)?;
    let retriever =
        VectorRetriever::from_text(HashingEmbedding::new(config.embedding_dim), &text, &chunker)
            .await?;
    info!(chunks = retriever.len(), "Retriever ready");
    Ok(retriever)
}
