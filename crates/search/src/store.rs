//! Per-paper index store
//!
//! Keeps one nearest-neighbour index per paper id. Indexes are built
//! wholesale and swapped in atomically, so a reader holding an entry never
//! sees a half-built index. Rebuilding a paper replaces its entry.

use crate::index::{build_flat_index, IndexBuilder, VectorIndex};
use paperdigest_common::embeddings::Embedder;
use paperdigest_common::errors::{AppError, Result};
use paperdigest_common::models::{Chunk, META_PAPER_ID};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

/// A chunk returned by a single-paper query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexHit {
    pub chunk_text: String,
    /// Distance to the query, lower is more similar
    pub distance: f32,
    pub metadata: BTreeMap<String, String>,
}

/// A built index together with the chunks it was built from
pub struct PaperIndex {
    paper_id: String,
    chunks: Vec<Chunk>,
    index: Box<dyn VectorIndex>,
}

impl PaperIndex {
    pub fn paper_id(&self) -> &str {
        &self.paper_id
    }

    /// Chunks in insertion (document) order
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Query with an already-embedded vector
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<IndexHit>> {
        let hits = self.index.search(query, k)?;
        Ok(hits
            .into_iter()
            .filter_map(|(position, distance)| {
                self.chunks.get(position).map(|chunk| IndexHit {
                    chunk_text: chunk.text.clone(),
                    distance,
                    metadata: chunk.metadata.clone(),
                })
            })
            .collect())
    }
}

impl std::fmt::Debug for PaperIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaperIndex")
            .field("paper_id", &self.paper_id)
            .field("chunks", &self.chunks.len())
            .field("dimension", &self.index.dimension())
            .finish()
    }
}

/// Keyed store mapping `paper_id` to its index
pub struct IndexStore {
    embedder: Arc<dyn Embedder>,
    index_builder: IndexBuilder,
    indexes: RwLock<HashMap<String, Arc<PaperIndex>>>,
    /// Serializes concurrent builds of the same paper
    build_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IndexStore {
    /// Create a store that builds exact flat indexes
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_index_builder(embedder, build_flat_index)
    }

    pub fn with_index_builder(embedder: Arc<dyn Embedder>, index_builder: IndexBuilder) -> Self {
        Self {
            embedder,
            index_builder,
            indexes: RwLock::new(HashMap::new()),
            build_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Embed every chunk and build the paper's index, replacing any
    /// existing index for `paper_id`. Returns the number of indexed chunks.
    #[instrument(skip(self, chunks), fields(chunk_count = chunks.len()))]
    pub async fn build(&self, paper_id: &str, mut chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Err(AppError::empty_input(format!("index build for {}", paper_id)));
        }

        for (position, chunk) in chunks.iter_mut().enumerate() {
            let owner = chunk
                .metadata
                .entry(META_PAPER_ID.to_string())
                .or_insert_with(|| paper_id.to_string());
            if owner != paper_id {
                return Err(AppError::Validation {
                    message: format!(
                        "chunk {} belongs to paper {}, not {}",
                        position, owner, paper_id
                    ),
                    field: Some(META_PAPER_ID.to_string()),
                });
            }
        }

        let paper_lock = {
            let mut locks = self.build_locks.lock().await;
            locks.entry(paper_id.to_string()).or_default().clone()
        };
        let _guard = paper_lock.lock().await;

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(AppError::Embedding {
                message: format!(
                    "embedder returned {} vectors for {} chunks of {}",
                    vectors.len(),
                    chunks.len(),
                    paper_id
                ),
            });
        }

        let index = (self.index_builder)(vectors)?;
        let chunk_count = chunks.len();
        let entry = Arc::new(PaperIndex {
            paper_id: paper_id.to_string(),
            chunks,
            index,
        });

        let replaced = self
            .indexes
            .write()
            .await
            .insert(paper_id.to_string(), entry)
            .is_some();

        paperdigest_common::metrics::record_index_build(chunk_count);
        info!(
            chunk_count,
            replaced,
            model = self.embedder.model_name(),
            "Index built"
        );

        Ok(chunk_count)
    }

    /// Return up to `k` chunks of one paper, most similar first
    #[instrument(skip(self, query_text))]
    pub async fn query(&self, paper_id: &str, query_text: &str, k: usize) -> Result<Vec<IndexHit>> {
        let entry = self
            .get(paper_id)
            .await
            .ok_or_else(|| AppError::unknown_paper(paper_id))?;

        if k == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(query_text).await?;
        let hits = entry.search(&query, k)?;
        debug!(hit_count = hits.len(), "Paper index queried");
        Ok(hits)
    }

    /// Embed text with the same model the indexes were built with
    pub async fn embed_query(&self, query_text: &str) -> Result<Vec<f32>> {
        self.embedder.embed(query_text).await
    }

    /// Current entry for a paper, if indexed
    pub async fn get(&self, paper_id: &str) -> Option<Arc<PaperIndex>> {
        self.indexes.read().await.get(paper_id).cloned()
    }

    pub async fn contains(&self, paper_id: &str) -> bool {
        self.indexes.read().await.contains_key(paper_id)
    }

    /// Indexed paper ids, sorted
    pub async fn paper_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.indexes.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.indexes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.indexes.read().await.is_empty()
    }

    /// Drop a paper's index and its build lock, waiting for any build of
    /// that paper in flight. Returns whether an index existed.
    pub async fn remove(&self, paper_id: &str) -> bool {
        let paper_lock = self.build_locks.lock().await.get(paper_id).cloned();

        let removed = match &paper_lock {
            Some(lock) => {
                let _guard = lock.lock().await;
                self.indexes.write().await.remove(paper_id).is_some()
            }
            None => self.indexes.write().await.remove(paper_id).is_some(),
        };

        if let Some(lock) = paper_lock {
            let mut locks = self.build_locks.lock().await;
            // A build already waiting on this lock keeps it registered
            if Arc::strong_count(&lock) == 2 {
                locks.remove(paper_id);
            }
        }

        removed
    }

    /// The paper's chunks in document order
    pub async fn chunks(&self, paper_id: &str) -> Result<Vec<Chunk>> {
        self.get(paper_id)
            .await
            .map(|entry| entry.chunks().to_vec())
            .ok_or_else(|| AppError::unknown_paper(paper_id))
    }

    /// Approximate a paper's text by joining its first `limit` chunks with
    /// line breaks. Overlapping spans between chunks are repeated.
    pub async fn document_text(&self, paper_id: &str, limit: usize) -> Result<String> {
        let entry = self
            .get(paper_id)
            .await
            .ok_or_else(|| AppError::unknown_paper(paper_id))?;

        Ok(entry
            .chunks()
            .iter()
            .take(limit)
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperdigest_common::embeddings::HashingEmbedder;
    use paperdigest_common::models::DEFAULT_SECTION;

    fn store() -> IndexStore {
        IndexStore::new(Arc::new(HashingEmbedder::new(64)))
    }

    fn chunks(paper_id: &str, texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(*t, paper_id, DEFAULT_SECTION, i))
            .collect()
    }

    #[tokio::test]
    async fn test_build_and_query() {
        let store = store();
        let count = store
            .build(
                "p1",
                chunks("p1", &["graph neural networks", "protein folding", "neural graph models"]),
            )
            .await
            .unwrap();
        assert_eq!(count, 3);

        let hits = store.query("p1", "graph neural networks", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_text, "graph neural networks");
        assert!(hits[0].distance <= hits[1].distance);
        assert_eq!(hits[0].metadata.get("paper_id").map(String::as_str), Some("p1"));
    }

    #[tokio::test]
    async fn test_unknown_paper() {
        let store = store();
        let err = store.query("missing", "anything", 3).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownPaper { ref paper_id } if paper_id == "missing"));
        assert!(store.chunks("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_rebuild_replaces() {
        let store = store();
        store.build("p1", chunks("p1", &["old text"])).await.unwrap();
        store
            .build("p1", chunks("p1", &["new text", "more new text"]))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        let texts: Vec<String> = store
            .chunks("p1")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["new text", "more new text"]);
    }

    #[tokio::test]
    async fn test_empty_build_rejected() {
        let store = store();
        let err = store.build("p1", Vec::new()).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyInput { .. }));
        assert!(!store.contains("p1").await);
    }

    #[tokio::test]
    async fn test_foreign_chunk_rejected() {
        let store = store();
        let err = store.build("p1", chunks("p2", &["text"])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_document_text_in_order() {
        let store = store();
        store
            .build("p1", chunks("p1", &["first", "second", "third"]))
            .await
            .unwrap();
        assert_eq!(store.document_text("p1", 2).await.unwrap(), "first\nsecond");
        assert_eq!(store.document_text("p1", 100).await.unwrap(), "first\nsecond\nthird");
    }

    #[tokio::test]
    async fn test_remove() {
        let store = store();
        store.build("p1", chunks("p1", &["text"])).await.unwrap();
        assert!(store.remove("p1").await);
        assert!(!store.remove("p1").await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_releases_build_lock() {
        let store = store();
        store.build("p1", chunks("p1", &["text"])).await.unwrap();
        store.build("p2", chunks("p2", &["other"])).await.unwrap();
        assert_eq!(store.build_locks.lock().await.len(), 2);

        assert!(store.remove("p1").await);
        let locks = store.build_locks.lock().await;
        assert_eq!(locks.len(), 1);
        assert!(locks.contains_key("p2"));
        drop(locks);

        store.build("p1", chunks("p1", &["again"])).await.unwrap();
        assert_eq!(store.chunks("p1").await.unwrap()[0].text, "again");
    }
}
