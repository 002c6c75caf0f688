//! # Moot Persistence
//!
//! In-memory storage for the debate engine:
//! - [`SessionStore`]: debate sessions with per-session turn locks; reads never wait on a turn
//! - [`load_cases`]: the precedent corpus
//! - [`MemoryVectorStore`]: similarity search over case embeddings
//!
//! Nothing is written to disk; sessions live for the process lifetime.

pub mod case_store;
pub mod error;
pub mod session_store;
pub mod vector_store;

pub use case_store::{load_cases, parse_cases};
pub use error::StorageError;
pub use session_store::{SessionStore, SessionTurn};
pub use vector_store::{
    cosine_similarity, MemoryVectorStore, VectorEmbedding, VectorError, VectorStoreBackend,
};
