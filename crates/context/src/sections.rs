//! Section boundary detection for section-wise summaries

use paperdigest_common::errors::{AppError, Result};
use regex_lite::Regex;

/// Splits a document into sections in document order
pub trait SectionSplitter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Sections in their original order. May include blank sections.
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// Treats a line holding one capitalized word (`Introduction`, `Results`)
/// as a heading. The heading line itself is not part of either section.
pub struct HeuristicSectionSplitter {
    heading: Regex,
}

impl HeuristicSectionSplitter {
    pub fn new() -> Result<Self> {
        let heading = Regex::new(r"\n[A-Z][a-z]+\n").map_err(|e| AppError::Configuration {
            message: format!("invalid heading pattern: {}", e),
        })?;
        Ok(Self { heading })
    }
}

impl SectionSplitter for HeuristicSectionSplitter {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.heading.split(text).collect()
    }
}

/// No detection: the whole document is one section
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeDocument;

impl SectionSplitter for WholeDocument {
    fn name(&self) -> &'static str {
        "whole_document"
    }

    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        vec![text]
    }
}
