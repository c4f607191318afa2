//! sqlrag vector crate - embedding service, vector index, chunking, and retrieval.
//!
//! Builds the Chinook knowledge base from the database schema, splits it
//! into overlapping chunks, indexes them with a hashing embedding, and serves
//! top-k passages to the SQL generator.

pub mod chunker;
pub mod embedding;
pub mod index;
pub mod knowledge;
pub mod retriever;

pub use chunker::TextChunker;
pub use embedding::{EmbeddingService, HashingEmbedding};
pub use index::{SearchHit, VectorIndex};
pub use knowledge::{build_knowledge_base, load_or_build};
pub use retriever::{build_retriever, Retriever, VectorRetriever};
