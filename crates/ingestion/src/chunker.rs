//! Text chunking module
//!
//! Splits extracted document text into bounded, overlapping chunks for
//! embedding. Two strategies are available:
//! - [`RecursiveChunker`]: separator-driven splitting (paragraphs, lines,
//!   sentences, words, characters) with a guaranteed overlap window
//! - [`SemanticChunker`]: delegates to the `text-splitter` crate

use paperdigest_common::config::{ChunkingConfig, ChunkingStrategy};
use paperdigest_common::errors::{AppError, Result};
use paperdigest_common::models::{Chunk, DEFAULT_SECTION};
use std::collections::VecDeque;
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::debug;

/// Separators in preference order. Anything still too long after the last
/// one is split into single characters.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " "];

/// Splits document text into chunks tagged with their paper
pub trait Chunker: Send + Sync {
    /// Strategy name, used in logs and metrics
    fn name(&self) -> &'static str;

    /// Split raw text into ordered chunk texts
    fn split_text(&self, text: &str) -> Vec<String>;

    /// Split one document into chunks carrying `paper_id`, the default
    /// section label and their position.
    fn split(&self, paper_id: &str, text: &str) -> Result<Vec<Chunk>> {
        if text.trim().is_empty() {
            return Err(AppError::empty_input(format!("chunking {}", paper_id)));
        }

        let chunks = self
            .split_text(text)
            .into_iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(t, paper_id, DEFAULT_SECTION, i))
            .collect::<Vec<_>>();

        paperdigest_common::metrics::record_chunks(chunks.len(), self.name());
        Ok(chunks)
    }

    /// Split page segments independently. Chunks record their 1-based page
    /// and a position that runs across the whole document. Blank pages are
    /// skipped.
    fn split_segments(&self, paper_id: &str, segments: &[String]) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for (page, segment) in segments.iter().enumerate() {
            if segment.trim().is_empty() {
                continue;
            }
            for text in self.split_text(segment) {
                let index = chunks.len();
                chunks.push(Chunk::new(text, paper_id, DEFAULT_SECTION, index).with_page(page + 1));
            }
        }

        if chunks.is_empty() {
            return Err(AppError::empty_input(format!("chunking {}", paper_id)));
        }

        debug!(
            paper_id,
            pages = segments.len(),
            chunk_count = chunks.len(),
            strategy = self.name(),
            "Segments chunked"
        );
        paperdigest_common::metrics::record_chunks(chunks.len(), self.name());
        Ok(chunks)
    }
}

/// Build the chunker selected by configuration
pub fn create_chunker(config: &ChunkingConfig) -> Result<Box<dyn Chunker>> {
    match config.strategy {
        ChunkingStrategy::Recursive => Ok(Box::new(RecursiveChunker::new(
            config.chunk_size,
            config.chunk_overlap,
        )?)),
        ChunkingStrategy::Semantic => Ok(Box::new(SemanticChunker::new(
            config.chunk_size,
            config.chunk_overlap,
        )?)),
    }
}

fn check_sizes(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(AppError::Validation {
            message: "chunk_size must be positive".to_string(),
            field: Some("chunk_size".to_string()),
        });
    }
    if chunk_overlap >= chunk_size {
        return Err(AppError::Validation {
            message: format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            ),
            field: Some("chunk_overlap".to_string()),
        });
    }
    Ok(())
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Recursive separator splitter. Lengths are counted in characters.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        check_sizes(chunk_size, chunk_overlap)?;
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Break `text` into pieces no longer than `chunk_size`, trying coarse
    /// separators first. Concatenating the pieces gives back `text`.
    fn atomize<'a>(&self, text: &'a str, separators: &[&str], out: &mut Vec<&'a str>) {
        if text.is_empty() {
            return;
        }
        if char_len(text) <= self.chunk_size {
            out.push(text);
            return;
        }

        match separators.split_first() {
            Some((separator, rest)) => {
                for piece in split_keeping_separator(text, separator) {
                    self.atomize(piece, rest, out);
                }
            }
            None => {
                let mut start = 0;
                for (offset, ch) in text.char_indices() {
                    let end = offset + ch.len_utf8();
                    out.push(&text[start..end]);
                    start = end;
                }
            }
        }
    }

    /// Greedily pack pieces into chunks, carrying a tail of at least
    /// `chunk_overlap` characters into the next chunk when it fits.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                push_chunk(&mut chunks, &window);

                while let Some(&(_, front_len)) = window.front() {
                    let needs_room = total + len > self.chunk_size;
                    let keeps_overlap = total - front_len >= self.chunk_overlap;
                    if !(needs_room || keeps_overlap) {
                        break;
                    }
                    window.pop_front();
                    total -= front_len;
                }
            }

            window.push_back((piece, len));
            total += len;
        }

        if !window.is_empty() {
            push_chunk(&mut chunks, &window);
        }

        chunks
    }
}

fn push_chunk(chunks: &mut Vec<String>, window: &VecDeque<(&str, usize)>) {
    let text: String = window.iter().map(|(piece, _)| *piece).collect();
    if !text.trim().is_empty() {
        chunks.push(text);
    }
}

/// Split on `separator`, leaving each occurrence at the end of the piece
/// before it
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (offset, matched) in text.match_indices(separator) {
        let end = offset + matched.len();
        pieces.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

impl Chunker for RecursiveChunker {
    fn name(&self) -> &'static str {
        "recursive"
    }

    fn split_text(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        self.atomize(text, SEPARATORS, &mut pieces);
        let chunks = self.merge(&pieces);

        debug!(
            input_chars = char_len(text),
            pieces = pieces.len(),
            chunk_count = chunks.len(),
            chunk_size = self.chunk_size,
            "Text chunked"
        );

        chunks
    }
}

/// Chunker backed by `text-splitter`, which picks boundaries by semantic level
pub struct SemanticChunker {
    splitter: TextSplitter<text_splitter::Characters>,
}

impl SemanticChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        check_sizes(chunk_size, chunk_overlap)?;
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| AppError::Configuration {
                message: format!("invalid chunk overlap: {}", e),
            })?;
        Ok(Self {
            splitter: TextSplitter::new(config),
        })
    }
}

impl Chunker for SemanticChunker {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn split_text(&self, text: &str) -> Vec<String> {
        let chunks: Vec<String> = self
            .splitter
            .chunks(text)
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string)
            .collect();

        debug!(
            input_chars = char_len(text),
            chunk_count = chunks.len(),
            "Text chunked"
        );

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> RecursiveChunker {
        RecursiveChunker::new(size, overlap).unwrap()
    }

    /// Longest suffix of `a` that is also a prefix of `b`, in characters
    fn shared_chars(a: &str, b: &str) -> usize {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        (0..=a.len().min(b.len()))
            .rev()
            .find(|&n| a[a.len() - n..] == b[..n])
            .unwrap_or(0)
    }

    #[test]
    fn test_1200_chars_make_three_chunks() {
        let text = "x".repeat(1200);
        let chunks = chunker(500, 50).split_text(&text);

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| char_len(c) <= 500));
        assert_eq!(char_len(&chunks[0]), 500);
        assert_eq!(char_len(&chunks[1]), 500);
        assert_eq!(char_len(&chunks[2]), 300);
        assert!(shared_chars(&chunks[0], &chunks[1]) >= 50);
        assert!(shared_chars(&chunks[1], &chunks[2]) >= 50);
    }

    #[test]
    fn test_word_text_overlaps() {
        let text = "word ".repeat(240);
        let chunks = chunker(500, 50).split_text(&text);

        assert_eq!(chunks.len(), 3);
        for pair in chunks.windows(2) {
            assert!(char_len(&pair[0]) <= 500);
            assert!(shared_chars(&pair[0], &pair[1]) >= 50);
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let para = "Sentence one here. Sentence two here.";
        let text = format!("{}\n\n{}\n\n{}", para, para, para);
        let chunks = chunker(45, 0).split_text(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], format!("{}\n\n", para));
        assert_eq!(chunks[2], para);
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunker(500, 50).split_text("A short abstract.");
        assert_eq!(chunks, vec!["A short abstract."]);
    }

    #[test]
    fn test_multibyte_lengths_in_chars() {
        let text = "é".repeat(30);
        let chunks = chunker(10, 2).split_text(&text);
        assert!(chunks.iter().all(|c| char_len(c) <= 10));
        assert_eq!(chunks[0], "é".repeat(10));
    }

    #[test]
    fn test_empty_input_rejected() {
        let chunker = chunker(500, 50);
        assert!(matches!(
            chunker.split("p1", "   \n\t "),
            Err(AppError::EmptyInput { .. })
        ));
        assert!(matches!(
            chunker.split_segments("p1", &["".to_string(), "  ".to_string()]),
            Err(AppError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_split_tags_metadata() {
        let chunks = chunker(20, 5)
            .split("p1", "alpha beta gamma delta epsilon zeta eta theta")
            .unwrap();
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.paper_id(), Some("p1"));
            assert_eq!(chunk.section(), "full");
            assert_eq!(chunk.chunk_index(), Some(i));
            assert_eq!(chunk.page(), None);
        }
    }

    #[test]
    fn test_segments_record_pages() {
        let segments = vec![
            "first page text".to_string(),
            "   ".to_string(),
            "third page text".to_string(),
        ];
        let chunks = chunker(500, 50).split_segments("p1", &segments).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page(), Some(1));
        assert_eq!(chunks[1].page(), Some(3));
        assert_eq!(chunks[1].chunk_index(), Some(1));
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(RecursiveChunker::new(0, 0).is_err());
        assert!(RecursiveChunker::new(100, 100).is_err());
        assert!(SemanticChunker::new(100, 150).is_err());
    }

    #[test]
    fn test_semantic_chunker_bounds() {
        let text = "This is a test sentence. ".repeat(100);
        let chunker = SemanticChunker::new(200, 20).unwrap();
        let chunks = chunker.split_text(&text);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| char_len(c) <= 200));
    }

    #[test]
    fn test_create_chunker_by_strategy() {
        let mut config = ChunkingConfig::new(300, 30).unwrap();
        assert_eq!(create_chunker(&config).unwrap().name(), "recursive");
        config.strategy = ChunkingStrategy::Semantic;
        assert_eq!(create_chunker(&config).unwrap().name(), "semantic");
    }
}
