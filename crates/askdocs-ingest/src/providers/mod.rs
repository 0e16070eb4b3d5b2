//! Provider abstractions for embeddings and vector storage

pub mod embedding;
pub mod openai;
pub mod pinecone;

pub use embedding::EmbeddingProvider;
pub use openai::OpenAiEmbedder;
pub use pinecone::{PineconeIndex, VectorRecord};
