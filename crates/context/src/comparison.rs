//! Comparison of several paper summaries in one prompt

use crate::prompts::{render, COMPARE_TEMPLATE, SUMMARY_SEPARATOR};
use paperdigest_common::errors::{AppError, Result};
use paperdigest_common::generation::TextGenerator;
use std::sync::Arc;
use tracing::{info, instrument};

/// Returned by [`Comparator::compare`] when fewer than two summaries are given
pub const INSUFFICIENT_PAPERS: &str = "Need at least 2 papers.";

/// Minimum number of summaries a comparison needs
pub const MIN_PAPERS: usize = 2;

/// Label each summary `Paper i` (1-based) and join them with a separator
pub fn combine_summaries<S: AsRef<str>>(summaries: &[S]) -> String {
    summaries
        .iter()
        .enumerate()
        .map(|(i, summary)| format!("Paper {}: {}", i + 1, summary.as_ref()))
        .collect::<Vec<_>>()
        .join(SUMMARY_SEPARATOR)
}

pub struct Comparator {
    generator: Arc<dyn TextGenerator>,
}

impl Comparator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Compare summaries, failing with `InsufficientInput` below two
    #[instrument(skip(self, summaries), fields(papers = summaries.len()))]
    pub async fn try_compare<S: AsRef<str> + Sync>(&self, summaries: &[S]) -> Result<String> {
        if summaries.len() < MIN_PAPERS {
            return Err(AppError::InsufficientInput {
                required: MIN_PAPERS,
                actual: summaries.len(),
            });
        }

        let combined = combine_summaries(summaries);
        let prompt = render(COMPARE_TEMPLATE, &[("combined", &combined)]);
        let comparison = self.generator.generate(&prompt).await?;

        info!(papers = summaries.len(), "Comparison completed");
        Ok(comparison)
    }

    /// Compare summaries. Fewer than two yields [`INSUFFICIENT_PAPERS`]
    /// instead of an error; generation failures still propagate.
    pub async fn compare<S: AsRef<str> + Sync>(&self, summaries: &[S]) -> Result<String> {
        match self.try_compare(summaries).await {
            Err(AppError::InsufficientInput { .. }) => Ok(INSUFFICIENT_PAPERS.to_string()),
            other => other,
        }
    }
}
