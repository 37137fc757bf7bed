//! Text extraction module
//!
//! Turns a paper file into ordered text segments, one per page for PDFs
//! (via lopdf) and a single segment for plain-text formats.

use paperdigest_common::errors::{AppError, Result};
use std::path::Path;
use tracing::{debug, warn};

/// Extracts ordered raw text segments from a file
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<Vec<String>>;
}

/// Pick an extractor from the file extension. Unknown extensions are
/// treated as PDF.
pub fn extractor_for(path: &Path) -> Box<dyn TextExtractor> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "md" | "markdown" => Box::new(PlainTextExtractor),
        _ => Box::new(PdfExtractor),
    }
}

fn extraction_error(path: &Path, message: impl Into<String>) -> AppError {
    AppError::Extraction {
        path: path.display().to_string(),
        message: message.into(),
    }
}

/// Per-page PDF text extraction
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<Vec<String>> {
        let doc = lopdf::Document::load(path)
            .map_err(|e| extraction_error(path, format!("Failed to load PDF: {}", e)))?;

        let pages = doc.get_pages();
        debug!(page_count = pages.len(), "Extracting text from PDF");

        let mut segments = Vec::with_capacity(pages.len());
        for (page_num, page_id) in pages.iter() {
            let raw = match doc.extract_text(&[*page_num]) {
                Ok(text) => text,
                Err(e) => {
                    debug!(page = page_num, error = %e, "Falling back to content stream scan");
                    match doc.get_page_content(*page_id) {
                        Ok(content) => extract_text_from_content(&content),
                        Err(e) => {
                            warn!(page = page_num, error = %e, "Failed to extract text from page, skipping");
                            String::new()
                        }
                    }
                }
            };
            segments.push(clean_text(&raw));
        }

        if segments.iter().all(|s| s.trim().is_empty()) {
            return Err(extraction_error(path, "No text content extracted from PDF"));
        }

        debug!(
            pages = segments.len(),
            chars = segments.iter().map(|s| s.chars().count()).sum::<usize>(),
            "Text extraction complete"
        );

        Ok(segments)
    }
}

/// Reads UTF-8 text files as a single segment
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<Vec<String>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| extraction_error(path, format!("Failed to read file: {}", e)))?;
        let cleaned = clean_text(&text);
        if cleaned.trim().is_empty() {
            return Err(extraction_error(path, "File contains no text"));
        }
        Ok(vec![cleaned])
    }
}

/// Scan a content stream for text shown between `BT` and `ET`
fn extract_text_from_content(content: &[u8]) -> String {
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;

    for line in content_str.lines() {
        let trimmed = line.trim();
        match trimmed {
            "BT" => in_text_block = true,
            "ET" => {
                in_text_block = false;
                text.push('\n');
            }
            _ if in_text_block => {
                if let Some(shown) = text_operand(trimmed) {
                    text.push_str(&shown);
                }
            }
            _ => {}
        }
    }

    text
}

/// Literal strings of a `Tj`, `'`, `"` or `TJ` operator
fn text_operand(line: &str) -> Option<String> {
    let shows_text = ["Tj", "TJ", "'", "\""].iter().any(|op| line.ends_with(op));
    if !shows_text {
        return None;
    }

    let mut result = String::new();
    let mut depth = 0usize;
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if depth > 0 => {
                current.push(ch);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '(' => {
                if depth > 0 {
                    current.push(ch);
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    result.push_str(&decode_pdf_string(&current));
                    current.clear();
                } else {
                    current.push(ch);
                }
            }
            _ if depth > 0 => current.push(ch),
            _ => {}
        }
    }

    (!result.is_empty()).then_some(result)
}

/// Decode PDF literal string escapes
fn decode_pdf_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some(c) => result.push(c),
                None => {}
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Normalize extracted text while keeping line structure: runs of spaces
/// collapse, lines are trimmed and at most one blank line separates
/// paragraphs.
fn clean_text(text: &str) -> String {
    let normalized = text
        .replace("\r\n", "\n")
        .replace('\u{FEFF}', "")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    let mut out = String::with_capacity(normalized.len());
    let mut blank_run = 0;
    for line in normalized.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(&line);
        out.push('\n');
    }

    out.trim_end().to_string()
}
