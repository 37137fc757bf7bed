//! PaperDigest ingestion
//!
//! Turns papers into indexed chunks:
//! - [`discovery`]: arXiv search and PDF download
//! - [`extract`]: per-page text extraction
//! - [`chunker`]: overlapping chunk splitting
//! - [`processor`]: extract, chunk and index one paper

pub mod chunker;
pub mod discovery;
pub mod extract;
pub mod processor;

pub use chunker::{create_chunker, Chunker, RecursiveChunker, SemanticChunker};
pub use discovery::{ArxivClient, PaperSource};
pub use extract::{extractor_for, PdfExtractor, PlainTextExtractor, TextExtractor};
pub use processor::{PaperProcessor, ProcessedPaper};
