//! Summarization, highlight and question-answering orchestration
//!
//! Every operation builds one bounded prompt (or one per section), hands it
//! to the text generator and returns the output verbatim. Inputs are
//! truncated by character count, keeping the head of the document.

use crate::prompts::{
    render, EXPECTED_HIGHLIGHTS, HIGHLIGHTS_TEMPLATE, QA_TEMPLATE, SECTION_TEMPLATE,
    SUMMARY_TEMPLATE,
};
use crate::sections::SectionSplitter;
use paperdigest_common::config::SummarizationConfig;
use paperdigest_common::errors::{AppError, Result};
use paperdigest_common::generation::TextGenerator;
use paperdigest_common::models::RetrievalResult;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => &text[..byte_offset],
        None => text,
    }
}

/// Bullet count of a highlights response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightCheck {
    pub bullets: usize,
    /// True when the response has exactly the requested number of bullets
    pub within_limit: bool,
}

/// Count bullet lines (`-`, `*`, `•` or `1.`/`1)` markers)
pub fn check_highlights(text: &str) -> HighlightCheck {
    let bullets = text.lines().filter(|line| is_bullet(line.trim_start())).count();
    HighlightCheck {
        bullets,
        within_limit: bullets == EXPECTED_HIGHLIGHTS,
    }
}

fn is_bullet(line: &str) -> bool {
    if ["- ", "* ", "• "].iter().any(|marker| line.starts_with(marker)) {
        return true;
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    digits > 0 && matches!(line[digits..].chars().next(), Some('.') | Some(')'))
}

/// Turns text into summaries, highlights and grounded answers
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    sections: Box<dyn SectionSplitter>,
    max_input_chars: usize,
    section_max_chars: usize,
}

impl Summarizer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        sections: Box<dyn SectionSplitter>,
        config: &SummarizationConfig,
    ) -> Self {
        Self {
            generator,
            sections,
            max_input_chars: config.max_input_chars,
            section_max_chars: config.section_max_chars,
        }
    }

    pub fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.generator
    }

    /// Summarize a paper's text, either whole or section by section
    #[instrument(skip(self, text), fields(input_chars = text.chars().count()))]
    pub async fn summarize(&self, text: &str, section_wise: bool) -> Result<String> {
        if text.trim().is_empty() {
            return Err(AppError::empty_input("summarize"));
        }

        if section_wise {
            return self.summarize_sections(text).await;
        }

        let excerpt = truncate_chars(text, self.max_input_chars);
        let prompt = render(SUMMARY_TEMPLATE, &[("text", excerpt)]);
        debug!(prompt_chars = prompt.chars().count(), "Summary prompt built");

        self.generator.generate(&prompt).await
    }

    async fn summarize_sections(&self, text: &str) -> Result<String> {
        let sections: Vec<&str> = self
            .sections
            .split(text)
            .into_iter()
            .filter(|section| !section.trim().is_empty())
            .collect();

        if sections.is_empty() {
            return Err(AppError::empty_input("section-wise summarize"));
        }

        let mut summaries = Vec::with_capacity(sections.len());
        for section in &sections {
            let excerpt = truncate_chars(section, self.section_max_chars);
            let prompt = render(SECTION_TEMPLATE, &[("section", excerpt)]);
            summaries.push(self.generator.generate(&prompt).await?);
        }

        info!(
            sections = sections.len(),
            splitter = self.sections.name(),
            "Section-wise summary completed"
        );
        Ok(summaries.join("\n\n"))
    }

    /// Ask for five bullet highlights. The response is returned as is; a
    /// warning is logged when it does not have five bullets.
    #[instrument(skip(self, text), fields(input_chars = text.chars().count()))]
    pub async fn highlights(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(AppError::empty_input("highlights"));
        }

        let excerpt = truncate_chars(text, self.max_input_chars);
        let prompt = render(HIGHLIGHTS_TEMPLATE, &[("text", excerpt)]);
        let output = self.generator.generate(&prompt).await?;

        let check = check_highlights(&output);
        if !check.within_limit {
            warn!(
                bullets = check.bullets,
                expected = EXPECTED_HIGHLIGHTS,
                "Highlights response has unexpected bullet count"
            );
        }

        Ok(output)
    }

    /// Answer a question from retrieved chunks, used in the order given
    #[instrument(skip(self, question, results), fields(result_count = results.len()))]
    pub async fn answer(&self, question: &str, results: &[RetrievalResult]) -> Result<String> {
        if question.trim().is_empty() {
            return Err(AppError::empty_input("answer: question"));
        }
        if results.is_empty() {
            return Err(AppError::empty_input("answer: retrieved context"));
        }

        let context = results
            .iter()
            .map(|r| r.chunk_text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = render(QA_TEMPLATE, &[("context", &context), ("question", question)]);
        debug!(prompt_chars = prompt.chars().count(), "Answer prompt built");

        self.generator.generate(&prompt).await
    }
}
