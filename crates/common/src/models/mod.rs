//! Core data model shared by the pipeline crates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Metadata key holding the owning paper id
pub const META_PAPER_ID: &str = "paper_id";
/// Metadata key holding the section label
pub const META_SECTION: &str = "section";
/// Metadata key holding the chunk position within the paper
pub const META_CHUNK_INDEX: &str = "chunk_index";
/// Metadata key holding the 1-based source page
pub const META_PAGE: &str = "page";

/// Section label used when a chunk is not attributed to a detected section
pub const DEFAULT_SECTION: &str = "full";

/// An academic paper, either discovered through a search index or uploaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Unique identifier (arXiv id or upload file stem)
    pub id: String,
    pub title: String,
    /// Ordered author names
    pub authors: Vec<String>,
    /// Abstract or summary text supplied by the source
    pub summary: String,
    /// Remote PDF location, if the paper came from a search index
    pub pdf_url: Option<String>,
    pub published: Option<DateTime<Utc>>,
    /// Local copy of the content, once downloaded or uploaded
    pub local_path: Option<PathBuf>,
}

impl Paper {
    /// Describe a locally uploaded file: the id is the file name without
    /// its `.pdf` extension, the title is the file name.
    pub fn from_local_file(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string());
        let id = file_name
            .strip_suffix(".pdf")
            .unwrap_or(&file_name)
            .to_string();

        Self {
            id,
            title: file_name,
            authors: Vec::new(),
            summary: String::new(),
            pdf_url: None,
            published: None,
            local_path: Some(path.to_path_buf()),
        }
    }

    /// Copy of this paper pointing at a local file
    pub fn with_local_path(mut self, path: PathBuf) -> Self {
        self.local_path = Some(path);
        self
    }
}

/// A contiguous span of a paper's text, the unit of embedding and retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

impl Chunk {
    pub fn new(text: impl Into<String>, paper_id: &str, section: &str, chunk_index: usize) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(META_PAPER_ID.to_string(), paper_id.to_string());
        metadata.insert(META_SECTION.to_string(), section.to_string());
        metadata.insert(META_CHUNK_INDEX.to_string(), chunk_index.to_string());
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// Attach the 1-based source page
    pub fn with_page(mut self, page: usize) -> Self {
        self.metadata.insert(META_PAGE.to_string(), page.to_string());
        self
    }

    pub fn paper_id(&self) -> Option<&str> {
        self.metadata.get(META_PAPER_ID).map(String::as_str)
    }

    pub fn section(&self) -> &str {
        self.metadata
            .get(META_SECTION)
            .map(String::as_str)
            .unwrap_or(DEFAULT_SECTION)
    }

    pub fn chunk_index(&self) -> Option<usize> {
        self.metadata.get(META_CHUNK_INDEX).and_then(|v| v.parse().ok())
    }

    pub fn page(&self) -> Option<usize> {
        self.metadata.get(META_PAGE).and_then(|v| v.parse().ok())
    }

    /// Length in characters (Unicode scalar values)
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One hit from a multi-paper search. Lower `score` means more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub paper_id: String,
    pub chunk_text: String,
    /// Distance between the query and chunk embeddings
    pub score: f32,
    pub metadata: BTreeMap<String, String>,
}

impl RetrievalResult {
    /// Map the distance onto (0, 1], higher is more similar
    pub fn similarity(&self) -> f32 {
        1.0 / (1.0 + self.score.max(0.0))
    }
}
