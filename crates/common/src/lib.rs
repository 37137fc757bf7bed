//! PaperDigest Common Library
//!
//! Shared code for all PaperDigest crates including:
//! - Paper, chunk and retrieval result types
//! - Embedding and text generation client abstractions
//! - Error types and handling
//! - Configuration management
//! - Metrics and tracing setup

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod generation;
pub mod metrics;
pub mod models;
pub mod telemetry;

// Re-export commonly used types
pub use config::AppConfig;
pub use embeddings::Embedder;
pub use errors::{AppError, Result};
pub use generation::TextGenerator;
pub use models::{Chunk, Paper, RetrievalResult};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
