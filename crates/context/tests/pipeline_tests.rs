//! End-to-end pipeline over local text files with a recording generator

use async_trait::async_trait;
use paperdigest_common::config::AppConfig;
use paperdigest_common::embeddings::HashingEmbedder;
use paperdigest_common::errors::{AppError, Result};
use paperdigest_common::generation::TextGenerator;
use paperdigest_common::models::Paper;
use paperdigest_context::ResearchAssistant;
use paperdigest_ingestion::PaperSource;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        Ok(format!("generated #{}", prompts.len()))
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

struct OfflineSource;

#[async_trait]
impl PaperSource for OfflineSource {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<Paper>> {
        Ok(Vec::new())
    }

    async fn fetch_pdf(&self, paper: &Paper, _docs_dir: &Path) -> Result<PathBuf> {
        Err(AppError::Discovery {
            message: format!("offline: {}", paper.id),
        })
    }
}

fn setup() -> (ResearchAssistant, Arc<RecordingGenerator>) {
    let generator = Arc::new(RecordingGenerator::default());
    let assistant = ResearchAssistant::with_components(
        AppConfig::default(),
        Arc::new(OfflineSource),
        Arc::new(HashingEmbedder::new(256)),
        generator.clone(),
    )
    .unwrap();
    (assistant, generator)
}

fn local_paper(dir: &Path, name: &str, body: &str) -> Paper {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    Paper::from_local_file(&path)
}

#[tokio::test]
async fn test_long_paper_summary_prompt_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let (assistant, generator) = setup();

    let body = "Sparse attention reduces quadratic cost in long sequences. ".repeat(200);
    let paper = local_paper(dir.path(), "sparse.txt", &body);
    assistant.process_paper(&paper).await.unwrap();

    let summary = assistant.summarize_paper(&paper.id, false).await.unwrap();
    assert_eq!(summary, "generated #1");

    let prompt = &generator.prompts()[0];
    let template_chars = paperdigest_context::prompts::SUMMARY_TEMPLATE.chars().count() - "{text}".len();
    assert!(prompt.chars().count() <= template_chars + 4000);
}

#[tokio::test]
async fn test_question_uses_retrieved_context() {
    let dir = tempfile::tempdir().unwrap();
    let (assistant, generator) = setup();

    let a = local_paper(
        dir.path(),
        "a.txt",
        "Graph convolution aggregates neighbour features.\n\nWe evaluate on citation graphs.",
    );
    let b = local_paper(dir.path(), "b.txt", "Diffusion models denoise images step by step.");
    assistant.process_paper(&a).await.unwrap();
    assistant.process_paper(&b).await.unwrap();

    let answer = assistant
        .ask("How does graph convolution work?", &[a.id.clone(), b.id.clone()])
        .await
        .unwrap();

    assert!(answer.sources.len() <= 3);
    assert!(answer.sources.windows(2).all(|w| w[0].score <= w[1].score));
    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("Question: How does graph convolution work?"));
    assert!(prompt.contains(&answer.sources[0].chunk_text));
}

#[tokio::test]
async fn test_section_wise_summary_joins_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let (assistant, generator) = setup();

    let paper = local_paper(
        dir.path(),
        "sections.txt",
        "Preamble\nIntroduction\nWe introduce a model.\nConclusion\nIt works.",
    );
    assistant.process_paper(&paper).await.unwrap();

    let summary = assistant.summarize_paper(&paper.id, true).await.unwrap();
    assert_eq!(summary, "generated #1\n\ngenerated #2\n\ngenerated #3");

    let prompts = generator.prompts();
    assert_eq!(prompts[1], "Summarize this section: We introduce a model.");
    assert_eq!(prompts[2], "Summarize this section: It works.");
}

#[tokio::test]
async fn test_comparison_labels_papers_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let (assistant, generator) = setup();

    let a = local_paper(dir.path(), "a.txt", "First paper about retrieval.");
    let b = local_paper(dir.path(), "b.txt", "Second paper about generation.");
    assistant.process_paper(&a).await.unwrap();
    assistant.process_paper(&b).await.unwrap();

    let comparison = assistant
        .compare_papers(&[a.id.clone(), b.id.clone()])
        .await
        .unwrap();
    assert_eq!(comparison, "generated #3");

    let prompt = generator.prompts().pop().unwrap();
    assert!(prompt.starts_with("Compare and contrast the following papers"));
    assert!(prompt.contains("Paper 1: generated #1\n\n---\n\nPaper 2: generated #2"));
}
