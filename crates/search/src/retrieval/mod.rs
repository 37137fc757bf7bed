//! Multi-paper retrieval
//!
//! Queries each requested paper's index, pools the hits and re-ranks them
//! globally by distance.

mod merge;

pub use merge::merge_ranked;

use crate::store::IndexStore;
use paperdigest_common::errors::Result;
use paperdigest_common::models::RetrievalResult;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Runs similarity queries across a set of papers
#[derive(Clone)]
pub struct RetrievalCoordinator {
    store: Arc<IndexStore>,
}

impl RetrievalCoordinator {
    pub fn new(store: Arc<IndexStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Return at most `k` chunks across `paper_ids`, closest first.
    ///
    /// Papers without an index are skipped. Every indexed paper contributes
    /// up to `k` hits before the pooled list is sorted and cut to `k`.
    #[instrument(skip(self, query, paper_ids), fields(papers = paper_ids.len()))]
    pub async fn search<S: AsRef<str>>(
        &self,
        query: &str,
        paper_ids: &[S],
        k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        let start = Instant::now();

        if k == 0 || paper_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut indexed = Vec::new();
        for paper_id in paper_ids.iter().map(AsRef::as_ref) {
            if !seen.insert(paper_id) {
                continue;
            }
            match self.store.get(paper_id).await {
                Some(entry) => indexed.push(entry),
                None => debug!(paper_id, "Skipping paper without index"),
            }
        }

        if indexed.is_empty() {
            info!("No indexed papers to search");
            return Ok(Vec::new());
        }

        let query_vector = self.store.embed_query(query).await?;

        let mut per_paper = Vec::with_capacity(indexed.len());
        for entry in &indexed {
            let hits = entry.search(&query_vector, k)?;
            per_paper.push(
                hits.into_iter()
                    .map(|hit| RetrievalResult {
                        paper_id: entry.paper_id().to_string(),
                        chunk_text: hit.chunk_text,
                        score: hit.distance,
                        metadata: hit.metadata,
                    })
                    .collect::<Vec<_>>(),
            );
        }

        let results = merge_ranked(per_paper, k);

        paperdigest_common::metrics::record_search(start.elapsed(), indexed.len(), results.len());
        info!(
            papers_queried = indexed.len(),
            result_count = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Search completed"
        );

        Ok(results)
    }
}
