//! Research assistant facade
//!
//! Wires discovery, ingestion, retrieval and generation together behind the
//! operations a front end needs: find papers, process them, ask questions,
//! summarize, highlight and compare.

use crate::comparison::Comparator;
use crate::sections::HeuristicSectionSplitter;
use crate::summarizer::Summarizer;
use paperdigest_common::config::AppConfig;
use paperdigest_common::embeddings::{create_embedder, Embedder};
use paperdigest_common::errors::Result;
use paperdigest_common::generation::{create_generator, TextGenerator};
use paperdigest_common::models::{Paper, RetrievalResult};
use paperdigest_ingestion::{create_chunker, ArxivClient, PaperProcessor, PaperSource, ProcessedPaper};
use paperdigest_search::{IndexStore, RetrievalCoordinator};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// A grounded answer and the chunks it was built from
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<RetrievalResult>,
}

pub struct ResearchAssistant {
    config: Arc<AppConfig>,
    source: Arc<dyn PaperSource>,
    processor: PaperProcessor,
    coordinator: RetrievalCoordinator,
    summarizer: Summarizer,
    comparator: Comparator,
    papers: RwLock<Vec<Paper>>,
}

impl ResearchAssistant {
    /// Build every collaborator from configuration
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let generator = create_generator(&config.generation)?;
        let source: Arc<dyn PaperSource> = Arc::new(ArxivClient::new(&config.discovery)?);
        Self::with_components(config, source, embedder, generator)
    }

    /// Build with caller-supplied collaborators
    pub fn with_components(
        config: AppConfig,
        source: Arc<dyn PaperSource>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self> {
        let store = Arc::new(IndexStore::new(embedder));
        let chunker = create_chunker(&config.chunking)?;
        let summarizer = Summarizer::new(
            generator.clone(),
            Box::new(HeuristicSectionSplitter::new()?),
            &config.summarization,
        );

        info!(
            chunking = ?config.chunking.strategy,
            embedding_model = store.embedder().model_name(),
            generation_model = generator.model_name(),
            "Research assistant ready"
        );

        Ok(Self {
            config: Arc::new(config),
            source,
            processor: PaperProcessor::new(chunker, store.clone()),
            coordinator: RetrievalCoordinator::new(store),
            summarizer,
            comparator: Comparator::new(generator),
            papers: RwLock::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        self.coordinator.store()
    }

    /// Search the paper source. `max_results` defaults to the configured limit.
    pub async fn discover(&self, query: &str, max_results: Option<usize>) -> Result<Vec<Paper>> {
        let max_results = max_results.unwrap_or(self.config.discovery.max_results);
        self.source.search(query, max_results).await
    }

    /// Download (when remote), extract, chunk and index a paper
    #[instrument(skip(self, paper), fields(paper_id = %paper.id))]
    pub async fn process_paper(&self, paper: &Paper) -> Result<ProcessedPaper> {
        let paper = match paper.local_path {
            Some(_) => paper.clone(),
            None => {
                let docs_dir = self.config.ensure_docs_dir()?;
                let path = self.source.fetch_pdf(paper, docs_dir).await?;
                paper.clone().with_local_path(path)
            }
        };

        let processed = self.processor.process(&paper).await?;

        let mut papers = self.papers.write().await;
        match papers.iter_mut().find(|p| p.id == paper.id) {
            Some(existing) => *existing = paper,
            None => papers.push(paper),
        }

        Ok(processed)
    }

    /// Process every PDF in `dir`; unreadable files are logged and skipped
    pub async fn process_directory(&self, dir: &Path) -> Result<Vec<Paper>> {
        let results = self.processor.process_directory(dir).await?;

        let mut papers = self.papers.write().await;
        let mut processed = Vec::with_capacity(results.len());
        for (paper, _) in results {
            match papers.iter_mut().find(|p| p.id == paper.id) {
                Some(existing) => *existing = paper.clone(),
                None => papers.push(paper.clone()),
            }
            processed.push(paper);
        }
        Ok(processed)
    }

    /// Papers processed so far, in processing order
    pub async fn papers(&self) -> Vec<Paper> {
        self.papers.read().await.clone()
    }

    /// Closest chunks across papers, using the configured `top_k`
    pub async fn search(&self, query: &str, paper_ids: &[String]) -> Result<Vec<RetrievalResult>> {
        self.coordinator
            .search(query, paper_ids, self.config.retrieval.top_k)
            .await
    }

    /// Answer a question from the papers' most relevant chunks
    #[instrument(skip(self, question))]
    pub async fn ask(&self, question: &str, paper_ids: &[String]) -> Result<Answer> {
        let sources = self
            .coordinator
            .search(question, paper_ids, self.config.retrieval.qa_top_k)
            .await?;
        let answer = self.summarizer.answer(question, &sources).await?;
        Ok(Answer { answer, sources })
    }

    /// Approximate full text of an indexed paper
    pub async fn paper_text(&self, paper_id: &str) -> Result<String> {
        self.store()
            .document_text(paper_id, self.config.retrieval.full_text_chunk_limit)
            .await
    }

    pub async fn summarize_paper(&self, paper_id: &str, section_wise: bool) -> Result<String> {
        let text = self.paper_text(paper_id).await?;
        self.summarizer.summarize(&text, section_wise).await
    }

    pub async fn paper_highlights(&self, paper_id: &str) -> Result<String> {
        let text = self.paper_text(paper_id).await?;
        self.summarizer.highlights(&text).await
    }

    /// Summarize each indexed paper and compare the summaries. Ids without
    /// an index are skipped; fewer than two summaries yields the
    /// insufficient-papers message.
    #[instrument(skip(self))]
    pub async fn compare_papers(&self, paper_ids: &[String]) -> Result<String> {
        let mut summaries = Vec::with_capacity(paper_ids.len());
        for paper_id in paper_ids {
            if !self.store().contains(paper_id).await {
                debug!(paper_id, "Skipping unindexed paper in comparison");
                continue;
            }
            summaries.push(self.summarize_paper(paper_id, false).await?);
        }
        self.comparator.compare(&summaries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::INSUFFICIENT_PAPERS;
    use async_trait::async_trait;
    use paperdigest_common::embeddings::HashingEmbedder;
    use paperdigest_common::errors::AppError;
    use paperdigest_common::generation::EchoGenerator;
    use std::path::PathBuf;

    /// Source that never reaches the network
    struct NoSource;

    #[async_trait]
    impl PaperSource for NoSource {
        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<Paper>> {
            Ok(Vec::new())
        }

        async fn fetch_pdf(&self, paper: &Paper, _docs_dir: &Path) -> Result<PathBuf> {
            Err(AppError::Discovery {
                message: format!("offline: {}", paper.id),
            })
        }
    }

    fn assistant() -> ResearchAssistant {
        ResearchAssistant::with_components(
            AppConfig::default(),
            Arc::new(NoSource),
            Arc::new(HashingEmbedder::new(64)),
            Arc::new(EchoGenerator),
        )
        .unwrap()
    }

    fn write_paper(dir: &Path, name: &str, body: &str) -> Paper {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        Paper::from_local_file(&path)
    }

    #[tokio::test]
    async fn test_process_and_ask() {
        let dir = tempfile::tempdir().unwrap();
        let assistant = assistant();
        let paper = write_paper(
            dir.path(),
            "gnn.txt",
            "Graph neural networks aggregate neighbour features.\n\nThey are trained end to end.",
        );

        let processed = assistant.process_paper(&paper).await.unwrap();
        assert!(processed.chunk_count >= 1);
        assert_eq!(assistant.papers().await.len(), 1);

        let answer = assistant
            .ask("How do graph networks work?", &[paper.id.clone()])
            .await
            .unwrap();
        assert!(!answer.sources.is_empty());
        assert!(answer.answer.starts_with("[echo"));
    }

    #[tokio::test]
    async fn test_reprocessing_replaces_record() {
        let dir = tempfile::tempdir().unwrap();
        let assistant = assistant();
        let paper = write_paper(dir.path(), "a.txt", "Some paper text.");

        assistant.process_paper(&paper).await.unwrap();
        assistant.process_paper(&paper).await.unwrap();
        assert_eq!(assistant.papers().await.len(), 1);
        assert_eq!(assistant.store().len().await, 1);
    }

    #[tokio::test]
    async fn test_remote_paper_uses_source() {
        let docs = tempfile::tempdir().unwrap();
        let assistant = ResearchAssistant::with_components(
            AppConfig {
                storage: paperdigest_common::config::StorageConfig {
                    docs_dir: docs.path().to_path_buf(),
                },
                ..AppConfig::default()
            },
            Arc::new(NoSource),
            Arc::new(HashingEmbedder::new(64)),
            Arc::new(EchoGenerator),
        )
        .unwrap();

        let paper = Paper {
            id: "2101.00001".to_string(),
            title: "Remote".to_string(),
            authors: vec![],
            summary: String::new(),
            pdf_url: Some("http://example.invalid/paper.pdf".to_string()),
            published: None,
            local_path: None,
        };
        let err = assistant.process_paper(&paper).await.unwrap_err();
        assert!(matches!(err, AppError::Discovery { .. }));
    }

    #[tokio::test]
    async fn test_directory_without_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        write_paper(dir.path(), "notes.txt", "Not a PDF, ignored.");

        let assistant = assistant();
        assert!(assistant.process_directory(dir.path()).await.unwrap().is_empty());
        assert!(assistant.papers().await.is_empty());
    }

    #[tokio::test]
    async fn test_summaries_need_index() {
        let assistant = assistant();
        assert!(matches!(
            assistant.summarize_paper("unknown", false).await,
            Err(AppError::UnknownPaper { .. })
        ));
    }

    #[tokio::test]
    async fn test_compare_skips_unindexed() {
        let dir = tempfile::tempdir().unwrap();
        let assistant = assistant();
        let a = write_paper(dir.path(), "a.txt", "Attention mechanisms for translation.");
        let b = write_paper(dir.path(), "b.txt", "Convolutions for image recognition.");
        assistant.process_paper(&a).await.unwrap();

        let single = assistant
            .compare_papers(&[a.id.clone(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(single, INSUFFICIENT_PAPERS);

        assistant.process_paper(&b).await.unwrap();
        let both = assistant
            .compare_papers(&[a.id.clone(), b.id.clone()])
            .await
            .unwrap();
        assert_ne!(both, INSUFFICIENT_PAPERS);
    }
}
