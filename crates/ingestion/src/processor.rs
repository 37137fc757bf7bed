//! Paper processor
//!
//! Core ingestion flow for one paper: text extraction, chunking and index
//! build.

use crate::chunker::Chunker;
use crate::extract::extractor_for;
use paperdigest_common::errors::{AppError, Result};
use paperdigest_common::models::Paper;
use paperdigest_search::IndexStore;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Outcome of processing one paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedPaper {
    pub paper_id: String,
    pub pages: usize,
    pub chunk_count: usize,
}

/// Extracts, chunks and indexes papers into an [`IndexStore`]
pub struct PaperProcessor {
    chunker: Box<dyn Chunker>,
    store: Arc<IndexStore>,
}

impl PaperProcessor {
    pub fn new(chunker: Box<dyn Chunker>, store: Arc<IndexStore>) -> Self {
        Self { chunker, store }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Index a paper from its local copy, replacing any earlier index
    #[instrument(skip(self, paper), fields(paper_id = %paper.id))]
    pub async fn process(&self, paper: &Paper) -> Result<ProcessedPaper> {
        let path = paper.local_path.as_deref().ok_or_else(|| AppError::Extraction {
            path: String::new(),
            message: format!("paper {} has no local content", paper.id),
        })?;

        let start = Instant::now();
        let segments = extractor_for(path).extract(path)?;
        let pages = segments.len();

        let chunks = self.chunker.split_segments(&paper.id, &segments)?;
        let chunk_count = self.store.build(&paper.id, chunks).await?;

        info!(
            pages,
            chunk_count,
            strategy = self.chunker.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Paper processed"
        );

        Ok(ProcessedPaper {
            paper_id: paper.id.clone(),
            pages,
            chunk_count,
        })
    }

    /// Index raw text that did not come from a file
    #[instrument(skip(self, text))]
    pub async fn process_text(&self, paper_id: &str, text: &str) -> Result<ProcessedPaper> {
        let chunks = self.chunker.split(paper_id, text)?;
        let chunk_count = self.store.build(paper_id, chunks).await?;

        Ok(ProcessedPaper {
            paper_id: paper_id.to_string(),
            pages: 1,
            chunk_count,
        })
    }

    /// Process every PDF in a directory. Failures are logged and skipped.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn process_directory(&self, dir: &Path) -> Result<Vec<(Paper, ProcessedPaper)>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "pdf").unwrap_or(false) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut results = Vec::new();
        for path in paths {
            let paper = Paper::from_local_file(&path);
            match self.process(&paper).await {
                Ok(processed) => results.push((paper, processed)),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Failed to process paper");
                }
            }
        }

        info!(total = results.len(), "Directory processing complete");
        Ok(results)
    }
}
